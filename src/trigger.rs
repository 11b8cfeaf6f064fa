//! Edge-triggered display gating: Auto, Normal and Single modes with
//! wall-clock holdoff.

use crate::types::{TriggerConfig, TriggerMode, TriggerSlope, TriggerSource};

/// Phase of the trigger machinery as of the last evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Armed,
    Triggered,
    Holdoff,
}

/// Everything the trigger needs to know about one display tick.
#[derive(Debug, Clone, Copy)]
pub struct TriggerInput {
    /// Two most recent display samples on the source channel, oldest first.
    pub last_two: Option<(f64, f64)>,
    /// Whether the source channel is enabled.
    pub source_active: bool,
    pub acquisition_running: bool,
    /// Session-clock time of this tick; the same clock drives holdoff.
    pub now_us: u64,
}

/// Decides, once per display tick, whether the window may refresh. The
/// machine is re-evaluated from the tick inputs each time; only the holdoff
/// deadline and the Single-shot latch persist between ticks.
#[derive(Debug)]
pub struct TriggerEngine {
    cfg: TriggerConfig,
    holdoff_until_us: Option<u64>,
    single_fired: bool,
    state: TriggerState,
}

impl TriggerEngine {
    pub fn new(cfg: TriggerConfig) -> Self {
        Self {
            cfg,
            holdoff_until_us: None,
            single_fired: false,
            state: TriggerState::Armed,
        }
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.cfg
    }

    /// Replace the configuration. Re-arms: the Single latch and any pending
    /// holdoff are cleared.
    pub fn set_config(&mut self, cfg: TriggerConfig) {
        self.cfg = cfg;
        self.holdoff_until_us = None;
        self.single_fired = false;
        self.state = TriggerState::Armed;
    }

    /// Clear the Single-shot latch so the next qualifying edge fires again.
    pub fn rearm(&mut self) {
        self.single_fired = false;
        self.state = TriggerState::Armed;
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Evaluate one display tick. Returns true when the display may update.
    pub fn evaluate(&mut self, input: TriggerInput) -> bool {
        // Auto free-runs, and so does an External source: the core carries
        // no external trigger line, so there is no edge to qualify against.
        if self.cfg.mode == TriggerMode::Auto || self.cfg.source == TriggerSource::External {
            self.state = TriggerState::Triggered;
            return true;
        }

        if let Some(deadline) = self.holdoff_until_us {
            if input.now_us < deadline {
                self.state = TriggerState::Holdoff;
                return false;
            }
            self.holdoff_until_us = None;
            self.state = TriggerState::Armed;
        }

        if self.cfg.mode == TriggerMode::Single && self.single_fired {
            self.state = TriggerState::Triggered;
            return false;
        }

        // No stale redraws: edge modes require live acquisition and a live
        // source channel with at least two samples.
        if !input.acquisition_running || !input.source_active {
            return false;
        }
        let Some((prev, curr)) = input.last_two else {
            return false;
        };

        let level = self.cfg.level;
        let fired = match self.cfg.slope {
            TriggerSlope::Rising => prev < level && level <= curr,
            TriggerSlope::Falling => prev > level && level >= curr,
        };

        if fired {
            if self.cfg.holdoff_ms > 0.0 {
                self.holdoff_until_us =
                    Some(input.now_us + (self.cfg.holdoff_ms * 1000.0) as u64);
            }
            if self.cfg.mode == TriggerMode::Single {
                self.single_fired = true;
            }
            self.state = TriggerState::Triggered;
        } else {
            self.state = TriggerState::Armed;
        }
        fired
    }
}

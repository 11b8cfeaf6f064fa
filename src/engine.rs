//! The capture engine: owns channel state, trigger, and the acquisition
//! thread, and publishes frames to the display path.
//!
//! Two periodic activities share the per-channel buffers. The acquisition
//! thread pulls tuples from the source at the sample rate, runs the
//! front-end transform and appends to the rings. The caller drives `tick`
//! at its display cadence; each tick evaluates the trigger and, when it
//! fires, assembles a complete frame. Each channel's state sits behind its
//! own mutex, so a push on one channel never contends with a snapshot of
//! another.

use crate::error::{ConfigError, EngineError, SourceError};
use crate::measure;
use crate::ring_buffer::SampleRing;
use crate::source::SampleSource;
use crate::transform::{self, DcEstimator};
use crate::trigger::{TriggerEngine, TriggerInput};
use crate::types::*;
use crate::window;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Per-channel state shared between the acquisition thread and the display
/// path: configuration, the AC-coupling estimator, and the sample history.
struct ChannelLane {
    cfg: ChannelConfig,
    dc: DcEstimator,
    ring: SampleRing,
}

/// Terminal report from the acquisition thread.
enum SourceStatus {
    Fault(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    /// The transport failed; an explicit `start` is required to resume.
    Faulted,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Ring buffer capacity per channel.
    pub max_samples: usize,
    /// Visible window length in samples.
    pub visible_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_samples: 1000,
            visible_count: 1000,
        }
    }
}

pub struct ScopeEngine {
    lanes: Arc<[Mutex<ChannelLane>; MAX_CHANNELS]>,
    trigger: TriggerEngine,
    clock: SessionClock,
    running: Arc<AtomicBool>,
    acq_handle: Option<JoinHandle<()>>,
    status_rx: Option<Receiver<SourceStatus>>,
    state: EngineState,
    last_fault: Option<String>,
    sample_rate_hz: f64,
    channel_count: usize,
    visible_count: usize,
    horizontal_position: i32,
}

impl ScopeEngine {
    pub fn new(cfg: EngineConfig) -> Result<Self, ConfigError> {
        if cfg.max_samples == 0 {
            return Err(ConfigError::InvalidBufferCapacity);
        }
        if cfg.visible_count == 0 {
            return Err(ConfigError::InvalidVisibleCount);
        }
        let lanes = std::array::from_fn(|_| {
            Mutex::new(ChannelLane {
                cfg: ChannelConfig::default(),
                dc: DcEstimator::new(),
                ring: SampleRing::new(cfg.max_samples),
            })
        });
        Ok(Self {
            lanes: Arc::new(lanes),
            trigger: TriggerEngine::new(TriggerConfig::default()),
            clock: SessionClock::new(),
            running: Arc::new(AtomicBool::new(false)),
            acq_handle: None,
            status_rx: None,
            state: EngineState::Idle,
            last_fault: None,
            sample_rate_hz: 200.0,
            channel_count: MAX_CHANNELS,
            visible_count: cfg.visible_count,
            horizontal_position: 0,
        })
    }

    // ─── Configuration ──────────────────────────────────────────────────

    pub fn configure_channel(&self, index: usize, cfg: ChannelConfig) -> Result<(), ConfigError> {
        if index >= MAX_CHANNELS {
            return Err(ConfigError::ChannelOutOfRange(index));
        }
        if !(cfg.impedance_ohms > 0.0) {
            return Err(ConfigError::InvalidImpedance(cfg.impedance_ohms));
        }
        if !(cfg.volts_per_div > 0.0) {
            return Err(ConfigError::InvalidVoltsPerDiv(cfg.volts_per_div));
        }
        let mut lane = self.lanes[index].lock().unwrap();
        // A coupling change invalidates the running DC estimate
        if lane.cfg.coupling != cfg.coupling {
            lane.dc.reset();
        }
        lane.cfg = cfg;
        Ok(())
    }

    pub fn configure_trigger(&mut self, cfg: TriggerConfig) -> Result<(), ConfigError> {
        if let TriggerSource::Channel(i) = cfg.source {
            if i >= MAX_CHANNELS {
                return Err(ConfigError::ChannelOutOfRange(i));
            }
        }
        if !cfg.level.is_finite() {
            return Err(ConfigError::InvalidTriggerLevel);
        }
        if !(cfg.holdoff_ms >= 0.0) || !cfg.holdoff_ms.is_finite() {
            return Err(ConfigError::InvalidHoldoff(cfg.holdoff_ms));
        }
        self.trigger.set_config(cfg);
        Ok(())
    }

    pub fn set_visible_count(&mut self, count: usize) -> Result<(), ConfigError> {
        if count == 0 {
            return Err(ConfigError::InvalidVisibleCount);
        }
        self.visible_count = count;
        Ok(())
    }

    pub fn set_horizontal_position(&mut self, offset: i32) {
        self.horizontal_position = offset;
    }

    pub fn trigger_config(&self) -> &TriggerConfig {
        self.trigger.config()
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────

    /// Start acquisition from `source`. History and DC estimates from any
    /// previous run are discarded. Fails if acquisition is already running.
    pub fn start(
        &mut self,
        mut source: Box<dyn SampleSource>,
        sample_rate_hz: f64,
        channel_count: usize,
    ) -> Result<(), EngineError> {
        if !(sample_rate_hz > 0.0) || !sample_rate_hz.is_finite() {
            return Err(ConfigError::InvalidSampleRate(sample_rate_hz).into());
        }
        if channel_count == 0 || channel_count > MAX_CHANNELS {
            return Err(ConfigError::InvalidChannelCount {
                got: channel_count,
                max: MAX_CHANNELS,
            }
            .into());
        }
        self.poll_status();
        if self.state == EngineState::Running {
            return Err(EngineError::AlreadyRunning);
        }

        self.sample_rate_hz = sample_rate_hz;
        self.channel_count = channel_count;
        self.last_fault = None;
        for lane in self.lanes.iter() {
            let mut lane = lane.lock().unwrap();
            lane.ring.clear();
            lane.dc.reset();
        }

        info!(
            "Acquisition started: {} ({} ch @ {} Hz)",
            source.describe(),
            channel_count,
            sample_rate_hz
        );
        let (status_tx, status_rx) = bounded::<SourceStatus>(1);
        self.status_rx = Some(status_rx);
        self.running.store(true, Ordering::SeqCst);

        let lanes = Arc::clone(&self.lanes);
        let running = Arc::clone(&self.running);
        let handle = thread::Builder::new()
            .name("acquisition".into())
            .spawn(move || {
                acquisition_loop(source.as_mut(), &lanes, channel_count, &running, &status_tx);
            })
            .expect("spawn acquisition thread");
        self.acq_handle = Some(handle);
        self.state = EngineState::Running;
        Ok(())
    }

    /// Stop acquisition and join the acquisition thread. Idempotent;
    /// buffers keep their last consistent contents.
    pub fn stop(&mut self) {
        self.poll_status();
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.acq_handle.take() {
            let _ = handle.join();
            info!("Acquisition stopped");
        }
        if self.state == EngineState::Running {
            self.state = EngineState::Idle;
        }
    }

    /// Clear the Single-shot latch.
    pub fn rearm_single(&mut self) {
        self.trigger.rearm();
    }

    pub fn state(&mut self) -> EngineState {
        self.poll_status();
        self.state
    }

    pub fn last_fault(&self) -> Option<&str> {
        self.last_fault.as_deref()
    }

    fn poll_status(&mut self) {
        let fault = match &self.status_rx {
            Some(rx) => match rx.try_recv() {
                Ok(SourceStatus::Fault(msg)) => Some(msg),
                Err(_) => None,
            },
            None => None,
        };
        if let Some(msg) = fault {
            error!("Acquisition fault: {}", msg);
            self.last_fault = Some(msg);
            self.state = EngineState::Faulted;
            self.running.store(false, Ordering::SeqCst);
            if let Some(handle) = self.acq_handle.take() {
                let _ = handle.join();
            }
        }
    }

    // ─── Display path ───────────────────────────────────────────────────

    /// One display tick. Returns `None` when the trigger gates the update;
    /// otherwise a complete frame — never a partial one.
    pub fn tick(&mut self) -> Option<Frame> {
        self.poll_status();
        let now_us = self.clock.now_us();
        let input = self.trigger_input(now_us);
        if !self.trigger.evaluate(input) {
            return None;
        }
        Some(self.compose_frame(now_us))
    }

    fn trigger_input(&self, now_us: u64) -> TriggerInput {
        let acquisition_running = self.state == EngineState::Running;
        match self.trigger.config().source {
            TriggerSource::External => TriggerInput {
                last_two: None,
                source_active: false,
                acquisition_running,
                now_us,
            },
            TriggerSource::Channel(i) => {
                let lane = self.lanes[i].lock().unwrap();
                TriggerInput {
                    last_two: lane.ring.last_two(),
                    source_active: lane.cfg.active,
                    acquisition_running,
                    now_us,
                }
            }
        }
    }

    fn compose_frame(&self, now_us: u64) -> Frame {
        // The measured channel is the trigger source; an External source
        // carries no data, so fall back to channel 1 like the reference rig
        let measure_channel = match self.trigger.config().source {
            TriggerSource::Channel(i) => i,
            TriggerSource::External => 0,
        };

        let mut traces = Vec::with_capacity(MAX_CHANNELS);
        let mut measured: Option<Vec<f64>> = None;
        for (i, lane) in self.lanes.iter().enumerate() {
            let lane = lane.lock().unwrap();
            let snap = lane.ring.snapshot(self.visible_count);
            if i == measure_channel && lane.cfg.active && !snap.is_empty() {
                measured = Some(snap.clone());
            }
            let (time_ms, volts) = window::select(
                &snap,
                &lane.cfg,
                self.visible_count,
                self.horizontal_position,
                self.sample_rate_hz,
            );
            traces.push(Trace { time_ms, volts });
        }

        let (frequency_hz, rms_volts) = match &measured {
            Some(samples) => (
                measure::frequency(samples, self.sample_rate_hz),
                Some(measure::rms(samples)),
            ),
            None => (None, None),
        };

        Frame {
            timestamp_us: now_us,
            traces,
            frequency_hz,
            rms_volts,
        }
    }

    /// Serializable capture of the current visible window, independent of
    /// trigger gating. Persistence is the caller's job.
    pub fn export_snapshot(&self) -> Snapshot {
        let traces = self
            .lanes
            .iter()
            .map(|lane| {
                let lane = lane.lock().unwrap();
                let snap = lane.ring.snapshot(self.visible_count);
                let (time_ms, volts) = window::select(
                    &snap,
                    &lane.cfg,
                    self.visible_count,
                    self.horizontal_position,
                    self.sample_rate_hz,
                );
                Trace { time_ms, volts }
            })
            .collect();
        Snapshot {
            sample_rate_hz: self.sample_rate_hz,
            traces,
        }
    }

    /// Raw stored display samples of one channel, most recent `max_count`.
    /// Diagnostics and tests; out-of-range indices yield an empty vec.
    pub fn channel_history(&self, index: usize, max_count: usize) -> Vec<f64> {
        match self.lanes.get(index) {
            Some(lane) => lane.lock().unwrap().ring.snapshot(max_count),
            None => Vec::new(),
        }
    }
}

impl Drop for ScopeEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn acquisition_loop(
    source: &mut dyn SampleSource,
    lanes: &[Mutex<ChannelLane>; MAX_CHANNELS],
    channel_count: usize,
    running: &AtomicBool,
    status_tx: &Sender<SourceStatus>,
) {
    let mut tuples: u64 = 0;
    let mut decode_errors: u64 = 0;
    while running.load(Ordering::SeqCst) {
        match source.next_tuple() {
            Ok(tuple) => {
                for (i, &raw) in tuple.volts.iter().take(channel_count).enumerate() {
                    let mut guard = lanes[i].lock().unwrap();
                    let lane = &mut *guard;
                    let v = transform::apply(raw, &lane.cfg, &mut lane.dc);
                    lane.ring.push(v);
                }
                tuples += 1;
                if tuples % 5000 == 0 {
                    info!("Acquisition: {} tuples, {} decode errors", tuples, decode_errors);
                }
            }
            Err(SourceError::Decode(msg)) => {
                decode_errors += 1;
                warn!("Skipping malformed record: {}", msg);
            }
            Err(SourceError::Transport(msg)) => {
                running.store(false, Ordering::SeqCst);
                let _ = status_tx.send(SourceStatus::Fault(msg));
                break;
            }
        }
    }
}

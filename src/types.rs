use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Number of input channels on the front panel.
pub const MAX_CHANNELS: usize = 4;

// ─── Channel configuration ──────────────────────────────────────────────────

/// How DC offset is handled at the input: AC removes it, DC passes it
/// through, GND shorts the input to the reference rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coupling {
    Ac,
    Dc,
    Gnd,
}

/// Fixed probe divisor between the signal under test and the input jack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeAttenuation {
    X1,
    X10,
}

impl ProbeAttenuation {
    pub fn factor(self) -> f64 {
        match self {
            ProbeAttenuation::X1 => 1.0,
            ProbeAttenuation::X10 => 10.0,
        }
    }
}

/// Per-channel front-end and display settings. Mutated only through
/// `ScopeEngine::configure_channel`; the acquisition path reads it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub active: bool,
    pub coupling: Coupling,
    pub probe: ProbeAttenuation,
    /// Input impedance in ohms; 50.0 or 1e6 on the reference hardware.
    pub impedance_ohms: f64,
    /// Display scale factor, volts per graticule division.
    pub volts_per_div: f64,
    /// Vertical trace offset in divisions.
    pub position_div: i32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            active: true,
            coupling: Coupling::Dc,
            probe: ProbeAttenuation::X1,
            impedance_ohms: 1e6,
            volts_per_div: 1.0,
            position_div: 0,
        }
    }
}

// ─── Trigger configuration ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerMode {
    /// Free-running: the display updates on every tick.
    Auto,
    /// Update only when a qualifying edge is present.
    Normal,
    /// Like Normal, but latches after one fire until explicitly re-armed.
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerSlope {
    Rising,
    Falling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerSource {
    Channel(usize),
    /// No external trigger line is wired into the core; an External source
    /// free-runs like Auto.
    External,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub mode: TriggerMode,
    pub source: TriggerSource,
    pub slope: TriggerSlope,
    /// Trigger threshold in volts.
    pub level: f64,
    /// Minimum time after a fire before another edge is recognized.
    pub holdoff_ms: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            mode: TriggerMode::Auto,
            source: TriggerSource::Channel(0),
            slope: TriggerSlope::Rising,
            level: 2.5,
            holdoff_ms: 0.0,
        }
    }
}

// ─── Published frames ───────────────────────────────────────────────────────

/// One channel's renderer-ready axes. Both vectors share a length; an
/// inactive channel or empty buffer yields empty vectors and the renderer
/// skips drawing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    pub time_ms: Vec<f64>,
    pub volts: Vec<f64>,
}

/// The result of one successful display tick: per-channel traces plus the
/// live measurements of the trigger channel. Regenerated every tick, never
/// persisted by the core.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    /// Microseconds since the engine's session clock started.
    pub timestamp_us: u64,
    /// Indexed by channel; always `MAX_CHANNELS` entries.
    pub traces: Vec<Trace>,
    pub frequency_hz: Option<f64>,
    pub rms_volts: Option<f64>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let freq = match self.frequency_hz {
            Some(v) => format!("{:.2} Hz", v),
            None => "N/A".to_string(),
        };
        let rms = match self.rms_volts {
            Some(v) => format!("{:.2} V", v),
            None => "N/A".to_string(),
        };
        write!(
            f,
            "t={:>10}µs  points[{}]  freq={}  rms={}",
            self.timestamp_us,
            self.traces
                .iter()
                .map(|t| t.volts.len().to_string())
                .collect::<Vec<_>>()
                .join(" "),
            freq,
            rms,
        )
    }
}

/// Serializable capture of the visible window across all channels, for
/// persistence by the caller. The core defines the shape, not the file
/// format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub sample_rate_hz: f64,
    /// Indexed by channel; inactive channels carry empty traces.
    pub traces: Vec<Trace>,
}

// ─── Session clock ──────────────────────────────────────────────────────────

/// Monotonic clock for the capture session. The display tick and the trigger
/// holdoff both read this clock, so holdoff expiry cannot drift against the
/// tick cadence.
#[derive(Clone)]
pub struct SessionClock {
    start: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

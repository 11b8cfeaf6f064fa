//! Error types for the capture engine.

use thiserror::Error;

/// Rejected configuration values. Configuration calls fail synchronously
/// and leave engine state untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("channel index {0} out of range")]
    ChannelOutOfRange(usize),

    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(f64),

    #[error("channel count must be between 1 and {max}, got {got}")]
    InvalidChannelCount { got: usize, max: usize },

    #[error("input impedance must be positive, got {0} ohms")]
    InvalidImpedance(f64),

    #[error("volts/div must be positive, got {0}")]
    InvalidVoltsPerDiv(f64),

    #[error("trigger level must be finite")]
    InvalidTriggerLevel,

    #[error("trigger holdoff must be a non-negative number of ms, got {0}")]
    InvalidHoldoff(f64),

    #[error("visible sample count must be positive")]
    InvalidVisibleCount,

    #[error("buffer capacity must be positive")]
    InvalidBufferCapacity,
}

/// Failures raised by an acquisition source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Malformed record: the current tick is skipped, acquisition continues.
    #[error("malformed record: {0}")]
    Decode(String),

    /// The transport is gone. Acquisition stops; resuming requires an
    /// explicit `start()`.
    #[error("transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("acquisition is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

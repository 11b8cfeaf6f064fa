//! The acquisition source contract shared by the synthetic generator and
//! the serial device reader, plus the device record decoder.

use crate::error::SourceError;

/// Volts per ADC code for the reference device (12-bit ADC on a 3.3 V rail).
pub const ADC_VOLTS_PER_CODE: f64 = 3.3 / 4096.0;

/// One tuple of per-channel raw voltages produced at a single acquisition
/// tick. Immutable once produced; `seq` increases monotonically per source.
#[derive(Debug, Clone)]
pub struct RawTuple {
    pub seq: u64,
    pub volts: Vec<f64>,
}

/// A periodic producer of per-channel voltage tuples.
///
/// `next_tuple` blocks for roughly one sample period and yields exactly one
/// tuple, a transient `Decode` error (caller skips the tick), or a terminal
/// `Transport` error (caller stops acquisition).
pub trait SampleSource: Send {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    fn next_tuple(&mut self) -> Result<RawTuple, SourceError>;
}

/// Decode one device record: `channel_count` comma-separated ADC codes,
/// scaled to volts. Records with extra trailing fields are truncated;
/// short or non-numeric records are transient decode failures.
pub fn parse_record(line: &str, channel_count: usize) -> Result<Vec<f64>, SourceError> {
    let mut volts = Vec::with_capacity(channel_count);
    for field in line.trim().split(',') {
        let code: f64 = field
            .trim()
            .parse()
            .map_err(|_| SourceError::Decode(format!("non-numeric field {:?}", field)))?;
        volts.push(code * ADC_VOLTS_PER_CODE);
    }
    if volts.len() < channel_count {
        return Err(SourceError::Decode(format!(
            "expected {} fields, got {}",
            channel_count,
            volts.len()
        )));
    }
    volts.truncate(channel_count);
    Ok(volts)
}

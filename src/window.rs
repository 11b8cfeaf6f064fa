//! Visible-window selection: maps a ring-buffer tail onto renderer-ready
//! time and voltage axes.

use crate::types::ChannelConfig;

/// Select the visible portion of one channel's history.
///
/// The time axis is `i * dt + horizontal_position * dt` in milliseconds
/// with `dt = 1000 / sample_rate_hz`; the voltage axis is the tail of
/// `samples`, scaled by the channel's volts/div and shifted by its vertical
/// position. Both axes share length `min(visible_count, samples.len())`.
///
/// An inactive channel or an empty buffer yields an empty pair; the
/// renderer skips drawing in that case.
pub fn select(
    samples: &[f64],
    cfg: &ChannelConfig,
    visible_count: usize,
    horizontal_position: i32,
    sample_rate_hz: f64,
) -> (Vec<f64>, Vec<f64>) {
    if !cfg.active || samples.is_empty() || visible_count == 0 {
        return (Vec::new(), Vec::new());
    }
    let n = visible_count.min(samples.len());
    let dt_ms = 1000.0 / sample_rate_hz;
    let offset_ms = horizontal_position as f64 * dt_ms;

    let time_ms = (0..n).map(|i| i as f64 * dt_ms + offset_ms).collect();
    let volts = samples[samples.len() - n..]
        .iter()
        .map(|&v| v * cfg.volts_per_div + cfg.position_div as f64)
        .collect();
    (time_ms, volts)
}

//! Minimal terminal readout for published frames. Stands in for the
//! plotting surface: per-channel point counts, a sparkline of the measured
//! channel, and the measurement labels.

use crate::types::Frame;

const SPARK_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render one frame as a short text block.
pub fn render(frame: &Frame, measure_channel: usize) -> String {
    let mut out = String::new();
    for (i, trace) in frame.traces.iter().enumerate() {
        if trace.volts.is_empty() {
            out.push_str(&format!("  CH{}: ---\n", i + 1));
        } else {
            out.push_str(&format!(
                "  CH{}: {:4} pts  last {:+.3}\n",
                i + 1,
                trace.volts.len(),
                trace.volts[trace.volts.len() - 1],
            ));
        }
    }
    if let Some(trace) = frame.traces.get(measure_channel) {
        if !trace.volts.is_empty() {
            out.push_str(&format!("  {}\n", sparkline(&trace.volts, 60)));
        }
    }
    let freq = match frame.frequency_hz {
        Some(f) => format!("{:.2} Hz", f),
        None => "N/A".to_string(),
    };
    let rms = match frame.rms_volts {
        Some(v) => format!("{:.2} V", v),
        None => "N/A".to_string(),
    };
    out.push_str(&format!("  Frequency: {}   RMS Voltage: {}\n", freq, rms));
    out
}

/// Downsample `values` to `width` columns of block characters.
fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = (max - min).max(1e-12);
    let cols = width.min(values.len());
    let stride = values.len() as f64 / cols as f64;
    (0..cols)
        .map(|c| {
            let v = values[(c as f64 * stride) as usize];
            let level = ((v - min) / span * 7.0).round() as usize;
            SPARK_CHARS[level.min(7)]
        })
        .collect()
}

//! Waveform measurements over the visible window: frequency and RMS.

/// Estimate the fundamental frequency of the windowed series.
///
/// A series that never goes negative is treated as pulsating DC (e.g. a
/// full-wave rectified sine): strict local maxima mark one pulse each, and
/// the pulse rate is the reported frequency. A bipolar series is measured
/// by zero crossings instead; a crossing occurs once per half-cycle, so the
/// crossing rate is divided by two.
///
/// Returns `None` when fewer than two peaks/crossings are found.
pub fn frequency(samples: &[f64], sample_rate_hz: f64) -> Option<f64> {
    if samples.len() < 2 || sample_rate_hz <= 0.0 {
        return None;
    }

    let unipolar = samples.iter().all(|&v| v >= 0.0);
    let marks: Vec<usize> = if unipolar {
        (1..samples.len() - 1)
            .filter(|&i| samples[i - 1] < samples[i] && samples[i] > samples[i + 1])
            .collect()
    } else {
        (1..samples.len())
            .filter(|&i| (samples[i - 1] >= 0.0) != (samples[i] >= 0.0))
            .collect()
    };

    if marks.len() < 2 {
        return None;
    }
    // Mean gap between consecutive marks, in samples
    let span = (marks[marks.len() - 1] - marks[0]) as f64;
    let mean_gap = span / (marks.len() - 1) as f64;
    if mean_gap <= 0.0 {
        return None;
    }
    let rate = sample_rate_hz / mean_gap;
    Some(if unipolar { rate } else { rate / 2.0 })
}

/// Root mean square of the windowed series; 0.0 for an empty window so the
/// display path never has to special-case it.
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|v| v * v).sum();
    (sum / samples.len() as f64).sqrt()
}

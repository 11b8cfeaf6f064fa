//! Synthetic waveform generator that exercises the full capture pipeline
//! without any hardware.

use crate::error::SourceError;
use crate::source::{RawTuple, SampleSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::thread;
use std::time::Duration;

const JITTER_SEED: u64 = 0x5C09_E5EE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveShape {
    Sine,
    Square,
    Triangle,
    /// Full-wave rectified sine: pulsating DC, never negative.
    RectifiedSine,
}

impl WaveShape {
    /// Parse a CLI-style shape name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sine" => Some(WaveShape::Sine),
            "square" => Some(WaveShape::Square),
            "triangle" => Some(WaveShape::Triangle),
            "rectified" => Some(WaveShape::RectifiedSine),
            _ => None,
        }
    }
}

/// Deterministic multi-channel signal source.
///
/// Channel 1 carries the configured shape and amplitude; the remaining
/// channels carry smaller quadrature-offset sines at half the fundamental,
/// matching the reference rig. Phase is derived from a monotonic sample
/// counter rather than wall-clock time, so OS scheduling jitter never
/// causes phase discontinuities.
pub struct SyntheticGenerator {
    sample_rate_hz: f64,
    channel_count: usize,
    shape: WaveShape,
    amplitude: f64,
    signal_hz: f64,
    /// Peak additive noise in volts; 0.0 disables the RNG entirely.
    jitter: f64,
    realtime: bool,
    seq: u64,
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new(sample_rate_hz: f64, channel_count: usize) -> Self {
        Self {
            sample_rate_hz,
            channel_count,
            shape: WaveShape::Sine,
            amplitude: 2.5,
            signal_hz: 1.0,
            jitter: 0.0,
            realtime: true,
            seq: 0,
            rng: StdRng::seed_from_u64(JITTER_SEED),
        }
    }

    pub fn with_shape(mut self, shape: WaveShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_signal_hz(mut self, signal_hz: f64) -> Self {
        self.signal_hz = signal_hz;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Disable the inter-sample sleep. Tests use this to fill buffers
    /// without waiting out the sample period.
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    fn sample_value(&mut self, channel: usize) -> f64 {
        let t = self.seq as f64 / self.sample_rate_hz;
        let base = if channel == 0 {
            let phase = 2.0 * PI * self.signal_hz * t;
            match self.shape {
                WaveShape::Sine => self.amplitude * phase.sin(),
                WaveShape::Square => {
                    if phase.sin() >= 0.0 {
                        self.amplitude
                    } else {
                        -self.amplitude
                    }
                }
                WaveShape::Triangle => self.amplitude * (2.0 / PI) * phase.sin().asin(),
                WaveShape::RectifiedSine => self.amplitude * phase.sin().abs(),
            }
        } else {
            let phase = 2.0 * PI * (self.signal_hz * 0.5) * t + channel as f64 * PI / 2.0;
            0.5 * phase.sin()
        };
        if self.jitter > 0.0 {
            base + self.rng.gen_range(-self.jitter..self.jitter)
        } else {
            base
        }
    }
}

impl SampleSource for SyntheticGenerator {
    fn describe(&self) -> String {
        format!(
            "synthetic {:?} {:.2} V @ {:.1} Hz",
            self.shape, self.amplitude, self.signal_hz
        )
    }

    fn next_tuple(&mut self) -> Result<RawTuple, SourceError> {
        if self.realtime {
            thread::sleep(Duration::from_secs_f64(1.0 / self.sample_rate_hz));
        }
        let volts = (0..self.channel_count)
            .map(|ch| self.sample_value(ch))
            .collect();
        let tuple = RawTuple {
            seq: self.seq,
            volts,
        };
        self.seq += 1;
        Ok(tuple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(gen: &mut SyntheticGenerator, n: usize) -> Vec<Vec<f64>> {
        (0..n).map(|_| gen.next_tuple().unwrap().volts).collect()
    }

    #[test]
    fn test_sine_peak_and_period() {
        // 1 Hz sine at 200 Hz: the quarter-cycle sample sits at the peak
        let mut gen = SyntheticGenerator::new(200.0, 1).with_realtime(false);
        let tuples = drain(&mut gen, 200);
        assert!((tuples[50][0] - 2.5).abs() < 1e-9);
        assert!(tuples[0][0].abs() < 1e-9);
        // One full cycle later the waveform repeats
        assert!((tuples[150][0] + 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_rectified_never_negative() {
        let mut gen = SyntheticGenerator::new(200.0, 1)
            .with_shape(WaveShape::RectifiedSine)
            .with_realtime(false);
        for tuple in drain(&mut gen, 400) {
            assert!(tuple[0] >= 0.0);
        }
    }

    #[test]
    fn test_square_takes_only_rail_values() {
        let mut gen = SyntheticGenerator::new(200.0, 1)
            .with_shape(WaveShape::Square)
            .with_amplitude(1.0)
            .with_realtime(false);
        for tuple in drain(&mut gen, 400) {
            assert!(tuple[0] == 1.0 || tuple[0] == -1.0);
        }
    }

    #[test]
    fn test_secondary_channels_are_smaller() {
        let mut gen = SyntheticGenerator::new(200.0, 4).with_realtime(false);
        for tuple in drain(&mut gen, 800) {
            assert_eq!(tuple.len(), 4);
            for &v in &tuple[1..] {
                assert!(v.abs() <= 0.5 + 1e-9);
            }
        }
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let mut gen = SyntheticGenerator::new(200.0, 2).with_realtime(false);
        for expect in 0..10u64 {
            assert_eq!(gen.next_tuple().unwrap().seq, expect);
        }
    }

    #[test]
    fn test_jitter_is_seeded_and_bounded() {
        let mut a = SyntheticGenerator::new(200.0, 1)
            .with_jitter(0.1)
            .with_realtime(false);
        let mut b = SyntheticGenerator::new(200.0, 1)
            .with_jitter(0.1)
            .with_realtime(false);
        for _ in 0..100 {
            let va = a.next_tuple().unwrap().volts[0];
            let vb = b.next_tuple().unwrap().volts[0];
            assert_eq!(va, vb, "same seed, same stream");
            assert!(va.abs() <= 2.5 + 0.1);
        }
    }

    #[test]
    fn test_shape_names() {
        assert_eq!(WaveShape::from_name("sine"), Some(WaveShape::Sine));
        assert_eq!(WaveShape::from_name("square"), Some(WaveShape::Square));
        assert_eq!(WaveShape::from_name("triangle"), Some(WaveShape::Triangle));
        assert_eq!(
            WaveShape::from_name("rectified"),
            Some(WaveShape::RectifiedSine)
        );
        assert_eq!(WaveShape::from_name("sawtooth"), None);
    }
}

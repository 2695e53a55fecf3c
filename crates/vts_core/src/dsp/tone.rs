//! Phase-continuous sine synthesis.

use std::f64::consts::PI;

/// Phase-accumulating sine source.
///
/// The phase carries across `fill` calls, so consecutive blocks at different
/// frequencies join without discontinuities. One generator per contiguous
/// audio section; resetting between sections keeps their starts identical.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    sample_rate: f64,
    amplitude: f64,
    phase: f64,
}

impl ToneGenerator {
    pub fn new(sample_rate: u32, amplitude: f64) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            amplitude,
            phase: 0.0,
        }
    }

    /// Reset the phase to zero (start of a new contiguous section).
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Fill `out` with a tone at `frequency_hz`, continuing from the current
    /// phase.
    pub fn fill(&mut self, frequency_hz: f64, out: &mut [f64]) {
        let step = 2.0 * PI * frequency_hz / self.sample_rate;
        for sample in out.iter_mut() {
            *sample = self.amplitude * self.phase.sin();
            self.phase += step;
            if self.phase >= 2.0 * PI {
                self.phase -= 2.0 * PI;
            }
        }
    }

    /// Generate `count` samples into a fresh buffer.
    pub fn generate(&mut self, frequency_hz: f64, count: usize) -> Vec<f64> {
        let mut out = vec![0.0; count];
        self.fill(frequency_hz, &mut out);
        out
    }
}

/// Apply a raised-cosine fade-in and fade-out over the first and last
/// `fraction` of the block. The interior is left unwindowed to preserve
/// frequency purity.
pub fn fade_edges(samples: &mut [f64], fraction: f64) {
    let n = samples.len();
    let edge = ((n as f64 * fraction) as usize).max(1);
    if n <= 2 * edge {
        return;
    }
    for i in 0..edge {
        let gain = 0.5 * (1.0 - (PI * i as f64 / edge as f64).cos());
        samples[i] *= gain;
        samples[n - 1 - i] *= gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_has_requested_amplitude_and_frequency() {
        let mut gen = ToneGenerator::new(48_000, 0.6);
        let samples = gen.generate(1000.0, 48_000);

        let peak = samples.iter().cloned().fold(0.0f64, |a, b| a.max(b.abs()));
        assert!((peak - 0.6).abs() < 0.01, "peak {}", peak);

        // 1 kHz over one second: 2000 zero crossings.
        let crossings = samples
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count();
        assert!(
            (crossings as i64 - 2000).abs() <= 2,
            "crossings {}",
            crossings
        );
    }

    #[test]
    fn phase_is_continuous_across_fill_calls() {
        let mut split = ToneGenerator::new(48_000, 1.0);
        let mut a = split.generate(800.0, 100);
        let b = split.generate(800.0, 100);
        a.extend(b);

        let mut whole = ToneGenerator::new(48_000, 1.0);
        let reference = whole.generate(800.0, 200);

        for (i, (x, y)) in a.iter().zip(reference.iter()).enumerate() {
            assert!((x - y).abs() < 1e-9, "sample {} differs: {} vs {}", i, x, y);
        }
    }

    #[test]
    fn phase_is_continuous_across_frequency_change() {
        let mut gen = ToneGenerator::new(48_000, 1.0);
        let a = gen.generate(800.0, 60);
        let b = gen.generate(1600.0, 60);
        // No jump at the seam: adjacent samples stay within the largest
        // possible single-sample step of a 1600 Hz unit sine.
        let max_step = 2.0 * std::f64::consts::PI * 1600.0 / 48_000.0;
        let seam = (a[59] - b[0]).abs();
        assert!(seam <= max_step, "seam step {} exceeds {}", seam, max_step);
    }

    #[test]
    fn fade_edges_tapers_both_ends() {
        let mut samples = vec![1.0; 100];
        fade_edges(&mut samples, 0.05);
        assert_eq!(samples[0], 0.0);
        assert!(samples[1] < 1.0);
        assert!(samples[99] < 1.0);
        // Interior untouched.
        assert_eq!(samples[50], 1.0);
    }

    #[test]
    fn fade_edges_leaves_tiny_blocks_alone() {
        let mut samples = vec![1.0; 3];
        fade_edges(&mut samples, 0.05);
        assert_eq!(samples, vec![1.0; 3]);
    }
}

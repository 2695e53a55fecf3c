//! FFT magnitude spectrum for short analysis windows.

use std::f64::consts::PI;
use std::sync::Mutex;

use rustfft::{num_complex::Complex, FftPlanner};

/// Spectrum analyzer with a cached FFT planner.
///
/// The planner cache is interior state only; `magnitude_spectrum` is
/// referentially transparent.
pub struct SpectrumAnalyzer {
    planner: Mutex<FftPlanner<f64>>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: Mutex::new(FftPlanner::new()),
        }
    }

    /// Hann-windowed magnitude spectrum over positive frequencies.
    ///
    /// The input is zero-padded to the next power of two; `bin_hz` reflects
    /// the padded length.
    pub fn magnitude_spectrum(&self, samples: &[f64], sample_rate: u32) -> MagnitudeSpectrum {
        let n = samples.len();
        if n == 0 {
            return MagnitudeSpectrum {
                magnitudes: Vec::new(),
                bin_hz: 0.0,
            };
        }
        let fft_len = n.next_power_of_two();

        let mut buf: Vec<Complex<f64>> = hann_windowed(samples)
            .into_iter()
            .map(|x| Complex::new(x, 0.0))
            .collect();
        buf.resize(fft_len, Complex::new(0.0, 0.0));

        let fft = {
            let mut planner = self.planner.lock().unwrap();
            planner.plan_fft_forward(fft_len)
        };
        fft.process(&mut buf);

        let magnitudes: Vec<f64> = buf[..fft_len / 2].iter().map(|c| c.norm()).collect();

        MagnitudeSpectrum {
            magnitudes,
            bin_hz: sample_rate as f64 / fft_len as f64,
        }
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Positive-frequency magnitudes with their bin spacing.
#[derive(Debug, Clone)]
pub struct MagnitudeSpectrum {
    pub magnitudes: Vec<f64>,
    pub bin_hz: f64,
}

impl MagnitudeSpectrum {
    /// Frequency of bin `i`.
    pub fn bin_frequency(&self, i: usize) -> f64 {
        i as f64 * self.bin_hz
    }

    /// The peak bin above DC: (frequency, magnitude).
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, &m)| (self.bin_frequency(i), m))
    }

    /// Sum of squared magnitudes over bins inside [lo_hz, hi_hz].
    pub fn band_energy(&self, lo_hz: f64, hi_hz: f64) -> f64 {
        self.magnitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                let f = self.bin_frequency(*i);
                f >= lo_hz && f <= hi_hz
            })
            .map(|(_, &m)| m * m)
            .sum()
    }

    /// Squared-magnitude energy of the peak bin and its two neighbours on
    /// each side (the resolved main lobe of a Hann-windowed tone).
    pub fn peak_lobe_energy(&self) -> f64 {
        let Some(peak_idx) = self
            .magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
        else {
            return 0.0;
        };
        let lo = peak_idx.saturating_sub(2);
        let hi = (peak_idx + 2).min(self.magnitudes.len() - 1);
        self.magnitudes[lo..=hi].iter().map(|m| m * m).sum()
    }
}

/// Copy of `samples` with a Hann window applied.
fn hann_windowed(samples: &[f64]) -> Vec<f64> {
    let n = samples.len();
    if n < 2 {
        return samples.to_vec();
    }
    samples
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let w = 0.5 * (1.0 - (2.0 * PI * i as f64 / (n - 1) as f64).cos());
            x * w
        })
        .collect()
}

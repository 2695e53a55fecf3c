//! The three independent bit-analysis methods.
//!
//! Each method inspects one bit block and either casts a vote (symbol,
//! confidence, fixed weight) or abstains. The small fixed set is modelled as
//! plain functions returning a tagged value; the voter in `voting` does not
//! care which method produced what.

use crate::dsp::SpectrumAnalyzer;
use crate::models::{classify_frequency, BitSymbol, ONE_RANGE_HZ, ZERO_RANGE_HZ};

/// Vote weight of the FFT method. Spectral peaks are the most reliable
/// evidence on VHS-grade audio, so the FFT outvotes either other method
/// alone but not both together.
pub(crate) const FFT_WEIGHT: f64 = 2.0;
/// Vote weight of the zero-crossing method.
pub(crate) const ZCR_WEIGHT: f64 = 1.0;
/// Vote weight of the autocorrelation method.
pub(crate) const AUTOCORR_WEIGHT: f64 = 1.0;

/// Normalized autocorrelation below this is not a usable period peak.
const SIGNIFICANT_PEAK: f64 = 0.3;

/// Spectral peaks below this magnitude are noise floor.
const MIN_PEAK_MAGNITUDE: f64 = 1e-6;

/// One method's decision for a bit block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MethodVote {
    pub symbol: BitSymbol,
    pub confidence: f64,
    pub weight: f64,
}

/// FFT analysis: classify the spectral peak frequency.
///
/// Confidence is the peak's main-lobe energy over the total energy in the
/// combined zero and one detection bands, clamped to [0, 1].
pub(crate) fn analyze_fft(
    analyzer: &SpectrumAnalyzer,
    samples: &[f64],
    sample_rate: u32,
) -> Option<MethodVote> {
    let spectrum = analyzer.magnitude_spectrum(samples, sample_rate);
    let (peak_hz, peak_mag) = spectrum.peak()?;
    if peak_mag < MIN_PEAK_MAGNITUDE {
        return None;
    }
    let symbol = classify_frequency(peak_hz)?;

    let band_total = spectrum.band_energy(ZERO_RANGE_HZ.0, ZERO_RANGE_HZ.1)
        + spectrum.band_energy(ONE_RANGE_HZ.0, ONE_RANGE_HZ.1);
    if band_total <= 0.0 {
        return None;
    }
    let confidence = (spectrum.peak_lobe_energy() / band_total).clamp(0.0, 1.0);

    Some(MethodVote {
        symbol,
        confidence,
        weight: FFT_WEIGHT,
    })
}

/// Zero-crossing analysis: estimate frequency from sign changes.
///
/// Confidence falls off linearly with distance from the nominal frequency,
/// reaching zero at half the nominal.
pub(crate) fn analyze_zero_crossings(samples: &[f64], sample_rate: u32) -> Option<MethodVote> {
    let n = samples.len();
    if n < 8 {
        return None;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();

    let estimated_hz = crossings as f64 * sample_rate as f64 / (2.0 * n as f64);
    let symbol = classify_frequency(estimated_hz)?;
    let nominal = symbol.frequency_hz();
    let confidence = (1.0 - (estimated_hz - nominal).abs() / (nominal * 0.5)).max(0.0);

    Some(MethodVote {
        symbol,
        confidence,
        weight: ZCR_WEIGHT,
    })
}

/// Autocorrelation analysis: find the first significant period peak in the
/// lag range for 500-2000 Hz and invert it to a frequency.
///
/// Confidence is the peak-to-sidelobe margin, where lags near integer
/// multiples of the detected period are part of the peak, not sidelobes.
pub(crate) fn analyze_autocorrelation(samples: &[f64], sample_rate: u32) -> Option<MethodVote> {
    let n = samples.len();
    if n < 16 {
        return None;
    }
    let energy: f64 = samples.iter().map(|x| x * x).sum();
    if energy < 1e-12 {
        return None;
    }

    let lag_min = ((sample_rate as f64 / 2000.0).round() as usize).max(1);
    let lag_max = ((sample_rate as f64 / 500.0).round() as usize).min(n - 1);
    if lag_max <= lag_min {
        return None;
    }

    let r: Vec<f64> = (lag_min..=lag_max)
        .map(|lag| {
            let mut acc = 0.0;
            for i in 0..(n - lag) {
                acc += samples[i] * samples[i + lag];
            }
            acc / energy
        })
        .collect();

    // First local maximum above the significance floor.
    let mut peak: Option<(usize, f64)> = None;
    for i in 0..r.len() {
        let left = if i == 0 { f64::NEG_INFINITY } else { r[i - 1] };
        let right = if i + 1 == r.len() {
            f64::NEG_INFINITY
        } else {
            r[i + 1]
        };
        if r[i] >= SIGNIFICANT_PEAK && r[i] >= left && r[i] >= right {
            peak = Some((i, r[i]));
            break;
        }
    }
    let (peak_idx, peak_val) = peak?;
    let period = lag_min + peak_idx;

    let frequency = sample_rate as f64 / period as f64;
    let symbol = classify_frequency(frequency)?;

    // Sidelobe level: the largest correlation at lags not explained by the
    // detected period (further than a quarter period from any multiple).
    let quarter = (period as f64 / 4.0).ceil() as usize;
    let mut sidelobe = 0.0f64;
    for (i, &v) in r.iter().enumerate() {
        let lag = lag_min + i;
        let rem = lag % period;
        let dist = rem.min(period - rem);
        if dist <= quarter {
            continue;
        }
        if v > sidelobe {
            sidelobe = v;
        }
    }
    let confidence = ((peak_val - sidelobe) / peak_val).clamp(0.0, 1.0);

    Some(MethodVote {
        symbol,
        confidence,
        weight: AUTOCORR_WEIGHT,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::ToneGenerator;

    fn tone(freq: f64, count: usize) -> Vec<f64> {
        ToneGenerator::new(48_000, 0.6).generate(freq, count)
    }

    #[test]
    fn fft_classifies_both_nominals() {
        let analyzer = SpectrumAnalyzer::new();
        let v = analyze_fft(&analyzer, &tone(800.0, 480), 48_000).unwrap();
        assert_eq!(v.symbol, BitSymbol::Zero);
        assert_eq!(v.weight, FFT_WEIGHT);
        assert!(v.confidence > 0.8, "confidence {}", v.confidence);

        let v = analyze_fft(&analyzer, &tone(1600.0, 480), 48_000).unwrap();
        assert_eq!(v.symbol, BitSymbol::One);
    }

    #[test]
    fn fft_abstains_on_guard_band_tone() {
        let analyzer = SpectrumAnalyzer::new();
        assert!(analyze_fft(&analyzer, &tone(1000.0, 480), 48_000).is_none());
    }

    #[test]
    fn fft_abstains_on_silence() {
        let analyzer = SpectrumAnalyzer::new();
        assert!(analyze_fft(&analyzer, &vec![0.0; 480], 48_000).is_none());
    }

    #[test]
    fn zcr_estimates_nominal_frequencies() {
        let v = analyze_zero_crossings(&tone(800.0, 480), 48_000).unwrap();
        assert_eq!(v.symbol, BitSymbol::Zero);
        assert!(v.confidence > 0.8, "confidence {}", v.confidence);

        let v = analyze_zero_crossings(&tone(1600.0, 480), 48_000).unwrap();
        assert_eq!(v.symbol, BitSymbol::One);
        assert!(v.confidence > 0.8);
    }

    #[test]
    fn zcr_abstains_on_guard_band_tone() {
        assert!(analyze_zero_crossings(&tone(1000.0, 480), 48_000).is_none());
    }

    #[test]
    fn zcr_abstains_on_tiny_blocks() {
        assert!(analyze_zero_crossings(&tone(800.0, 4), 48_000).is_none());
    }

    #[test]
    fn autocorrelation_finds_both_periods() {
        let v = analyze_autocorrelation(&tone(800.0, 480), 48_000).unwrap();
        assert_eq!(v.symbol, BitSymbol::Zero);
        assert!(v.confidence > 0.8, "confidence {}", v.confidence);

        let v = analyze_autocorrelation(&tone(1600.0, 480), 48_000).unwrap();
        assert_eq!(v.symbol, BitSymbol::One);
        assert!(v.confidence > 0.8, "confidence {}", v.confidence);
    }

    #[test]
    fn autocorrelation_abstains_on_test_tone() {
        // 1 kHz has a clear period, but it inverts to the guard band.
        assert!(analyze_autocorrelation(&tone(1000.0, 480), 48_000).is_none());
    }

    #[test]
    fn autocorrelation_abstains_on_silence() {
        assert!(analyze_autocorrelation(&vec![0.0; 480], 48_000).is_none());
    }
}

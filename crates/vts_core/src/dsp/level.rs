//! Level measurement and PCM scale conversion.

/// Full-scale value of int16 PCM, for converting thresholds quoted on the
/// int16 scale to the [-1, 1] float scale used throughout the crate.
pub const RMS_INT16_SCALE: f64 = 32_768.0;

/// Root-mean-square level of a block.
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|x| x * x).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Convert int16 PCM samples to [-1, 1] floats.
pub fn pcm16_to_f64(samples: &[i16]) -> Vec<f64> {
    samples
        .iter()
        .map(|&s| s as f64 / RMS_INT16_SCALE)
        .collect()
}

/// Convert [-1, 1] floats to int16 PCM with clamping.
pub fn f64_to_pcm16(samples: &[f64]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s * 32_767.0).clamp(-32_768.0, 32_767.0).round() as i16)
        .collect()
}

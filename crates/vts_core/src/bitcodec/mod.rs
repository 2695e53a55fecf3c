//! Single-bit FSK codec.
//!
//! A bit is one fixed-length block of audio: an 800 Hz tone for zero, a
//! 1600 Hz tone for one. Decoding runs three independent analyses (FFT,
//! zero-crossing rate, autocorrelation) and combines them by weighted vote.
//! No-decision is a normal outcome, never a panic; ambiguous blocks simply
//! produce `None` and the frame codec above gives up on that frame.

mod methods;
mod voting;

use crate::dsp::{fade_edges, SpectrumAnalyzer, ToneGenerator};
use crate::models::{BitSymbol, DecodedBit};

use methods::{analyze_autocorrelation, analyze_fft, analyze_zero_crossings};
use voting::combine_votes;

/// Fraction of a bit block faded in/out to suppress keying transients.
pub const FADE_FRACTION: f64 = 0.05;

/// Encode one bit as a block of `sample_count` samples.
///
/// The tone generator carries phase across calls, so consecutive bits join
/// without discontinuities. A 5% raised-cosine fade is applied at both
/// edges; the interior is unwindowed to preserve frequency purity.
pub fn encode_bit(symbol: BitSymbol, sample_count: usize, tone: &mut ToneGenerator) -> Vec<f64> {
    let mut out = tone.generate(symbol.frequency_hz(), sample_count);
    fade_edges(&mut out, FADE_FRACTION);
    out
}

/// Multi-method bit decoder.
///
/// Holds a cached FFT planner; `decode` itself is stateless and
/// referentially transparent.
pub struct BitDecoder {
    sample_rate: u32,
    spectrum: SpectrumAnalyzer,
}

impl BitDecoder {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            spectrum: SpectrumAnalyzer::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decode one bit block.
    ///
    /// Returns `None` when no analysis method reaches a decision.
    pub fn decode(&self, samples: &[f64]) -> Option<DecodedBit> {
        let mut votes = Vec::with_capacity(3);
        if let Some(v) = analyze_fft(&self.spectrum, samples, self.sample_rate) {
            votes.push(v);
        }
        if let Some(v) = analyze_zero_crossings(samples, self.sample_rate) {
            votes.push(v);
        }
        if let Some(v) = analyze_autocorrelation(samples, self.sample_rate) {
            votes.push(v);
        }
        combine_votes(&votes)
    }
}

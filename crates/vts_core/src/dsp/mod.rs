//! Shared DSP primitives.
//!
//! A single module of pure functions consumed by both the encoder and the
//! decoder sides: tone synthesis, edge windowing, single-bin (Goertzel) and
//! full-spectrum frequency analysis, and level measurement. Nothing here
//! owns configuration or does I/O.

mod goertzel;
mod level;
mod spectrum;
mod tone;

pub use goertzel::goertzel_power;
pub use level::{f64_to_pcm16, pcm16_to_f64, rms, RMS_INT16_SCALE};
pub use spectrum::{MagnitudeSpectrum, SpectrumAnalyzer};
pub use tone::{fade_edges, ToneGenerator};

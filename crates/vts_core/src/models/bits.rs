//! Bit symbols and the FSK frequency plan.

use serde::{Deserialize, Serialize};

/// Nominal tone frequency for a zero bit.
pub const FREQ_ZERO_HZ: f64 = 800.0;
/// Nominal tone frequency for a one bit (exactly double, for a 2:1 ratio
/// that survives VHS wow and flutter).
pub const FREQ_ONE_HZ: f64 = 1600.0;

/// Accepted detection range for a zero bit.
pub const ZERO_RANGE_HZ: (f64, f64) = (650.0, 950.0);
/// Accepted detection range for a one bit.
pub const ONE_RANGE_HZ: (f64, f64) = (1350.0, 1850.0);

/// A logical bit as carried by the FSK audio and the visual strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitSymbol {
    Zero,
    One,
}

impl BitSymbol {
    /// The tone frequency that encodes this symbol.
    pub fn frequency_hz(self) -> f64 {
        match self {
            BitSymbol::Zero => FREQ_ZERO_HZ,
            BitSymbol::One => FREQ_ONE_HZ,
        }
    }

    pub fn from_bit(bit: bool) -> Self {
        if bit {
            BitSymbol::One
        } else {
            BitSymbol::Zero
        }
    }

    pub fn as_bit(self) -> bool {
        matches!(self, BitSymbol::One)
    }
}

/// Classify a measured frequency into a bit symbol.
///
/// The two ranges do not overlap; the 400 Hz gap between 950 and 1350 Hz is
/// a guard band. Frequencies outside both ranges (including the 1 kHz test
/// tone) yield no decision.
pub fn classify_frequency(hz: f64) -> Option<BitSymbol> {
    if hz >= ZERO_RANGE_HZ.0 && hz <= ZERO_RANGE_HZ.1 {
        Some(BitSymbol::Zero)
    } else if hz >= ONE_RANGE_HZ.0 && hz <= ONE_RANGE_HZ.1 {
        Some(BitSymbol::One)
    } else {
        None
    }
}

/// One decoded bit with the combined confidence of the methods that voted
/// for it, in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedBit {
    pub symbol: BitSymbol,
    pub confidence: f64,
}

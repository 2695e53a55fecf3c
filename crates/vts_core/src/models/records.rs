//! The per-frame payload: a 24-bit frame id with an 8-bit checksum.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Largest encodable frame id (24 bits).
pub const MAX_FRAME_ID: u32 = (1 << 24) - 1;

/// Compute the 8-bit checksum of a 24-bit frame id.
///
/// With the id bits indexed MSB-first as i = 0..23, the checksum is the XOR
/// of `(i + 1) & 0xFF` over all set bits, finally XORed with the low byte of
/// the id. Deterministic and reimplemented identically by the decoder; a
/// single flipped payload bit changes the result.
pub fn compute_checksum(frame_id: u32) -> u8 {
    let mut cs: u8 = 0;
    for i in 0..24u32 {
        if (frame_id >> (23 - i)) & 1 == 1 {
            cs ^= ((i + 1) & 0xFF) as u8;
        }
    }
    cs ^ (frame_id & 0xFF) as u8
}

/// One frame's payload as carried on the wire: 24-bit id + 8-bit checksum.
///
/// Constructed by the encoder per frame and reconstructed by the decoder;
/// never mutated. A value of this type always satisfies
/// `checksum == compute_checksum(frame_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecord {
    frame_id: u32,
    checksum: u8,
}

impl FrameRecord {
    /// Create a record for a frame id, computing its checksum.
    pub fn new(frame_id: u32) -> CodecResult<Self> {
        if frame_id > MAX_FRAME_ID {
            return Err(CodecError::FrameIdOutOfRange { frame_id });
        }
        Ok(Self {
            frame_id,
            checksum: compute_checksum(frame_id),
        })
    }

    /// Reassemble a record from decoded parts, validating the checksum.
    ///
    /// Returns `None` when the checksum does not match; a corrupted frame is
    /// a normal decode outcome, not an error.
    pub fn from_parts(frame_id: u32, checksum: u8) -> Option<Self> {
        if frame_id > MAX_FRAME_ID || compute_checksum(frame_id) != checksum {
            return None;
        }
        Some(Self { frame_id, checksum })
    }

    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// The 32 wire bits, MSB of the frame id first, then the checksum bits
    /// MSB first.
    pub fn to_bits(&self) -> [bool; 32] {
        let word = (self.frame_id << 8) | self.checksum as u32;
        std::array::from_fn(|i| (word >> (31 - i)) & 1 == 1)
    }

    /// Reassemble from 32 wire bits, validating the checksum.
    pub fn from_bits(bits: &[bool; 32]) -> Option<Self> {
        let word = bits.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32);
        Self::from_parts(word >> 8, (word & 0xFF) as u8)
    }
}

/// Render a frame id as an HH:MM:SS:FF display string.
///
/// NTSC uses 30 as the display frame base, matching broadcast convention for
/// non-drop timecode.
pub fn frame_id_to_timecode_string(frame_id: u32, fps: f64) -> String {
    let base = fps.round() as u32;
    let total_seconds = frame_id / base;
    let ff = frame_id % base;
    let hh = total_seconds / 3600;
    let mm = (total_seconds % 3600) / 60;
    let ss = total_seconds % 60;
    format!("{:02}:{:02}:{:02}:{:02}", hh, mm, ss, ff)
}

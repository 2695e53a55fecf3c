//! Core value types shared across the codec.
//!
//! Everything here is a plain owned value; there is no shared mutable state
//! between the encoder and decoder sides.

mod bits;
mod detections;
mod format;
mod records;

pub use bits::{
    classify_frequency, BitSymbol, DecodedBit, FREQ_ONE_HZ, FREQ_ZERO_HZ, ONE_RANGE_HZ,
    ZERO_RANGE_HZ,
};
pub use detections::{LockedRegion, TimecodeDetection};
pub use format::{CyclePhase, CycleStructure, FormatParams, VideoSystem};
pub use records::{compute_checksum, frame_id_to_timecode_string, FrameRecord, MAX_FRAME_ID};

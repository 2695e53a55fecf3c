//! VTS Core - VHS timecode codec and sync-offset correlator
//!
//! This crate generates a synchronized audio+video test pattern in which every
//! video frame carries its own identifier (as an FSK tone in the audio and as
//! a binary strip in the picture), and decodes captured recordings of that
//! pattern to measure the temporal offset between the two streams.
//!
//! # Architecture
//!
//! The pipeline consists of pure components composed by the caller:
//!
//! 1. **Pattern generation** (`pattern`): emit one or more 4-phase test
//!    cycles (test chart / silence / timecode / silence) as raw audio sample
//!    blocks and per-frame pixel buffers. Muxing into a file is external.
//!
//! 2. **Cycle locking** (`locker`): given captured audio, locate the
//!    timecode-bearing section of each cycle from the energy envelope and
//!    derive exact frame and sample boundaries.
//!
//! 3. **Frame decoding** (`framecodec`): recover checksum-validated frame
//!    identifiers from a locked region, from the audio (strict or tolerant
//!    mode) and from the video strip independently.
//!
//! 4. **Correlation** (`correlate`): sequentially match the two detection
//!    streams by frame id and report offset statistics.
//!
//! The `bitcodec` and `dsp` modules hold the single-bit FSK codec and the
//! shared signal primitives underneath all of the above.
//!
//! No component does I/O, touches the clock, or keeps state between calls;
//! every operation is a function of its inputs.

pub mod bitcodec;
pub mod correlate;
pub mod dsp;
pub mod error;
pub mod framecodec;
pub mod locker;
pub mod logging;
pub mod models;
pub mod pattern;

pub use correlate::{OffsetMatch, OffsetReport};
pub use error::{CodecError, CodecResult};
pub use framecodec::DecodeMode;
pub use locker::{CycleLock, LockConfig, LockDiagnostic};
pub use models::{
    BitSymbol, CyclePhase, CycleStructure, DecodedBit, FormatParams, FrameRecord, LockedRegion,
    TimecodeDetection, VideoSystem,
};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

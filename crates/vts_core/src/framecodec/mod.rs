//! Frame-record codec: 24-bit id + 8-bit checksum per video frame.
//!
//! The same 32-bit record is carried twice per frame, independently:
//!
//! - as FSK audio occupying exactly that frame's share of the sample stream
//!   (`audio`), and
//! - as a binary strip across the top of the picture (`video`).
//!
//! Decoders report only checksum-valid records; a frame that fails to decode
//! is simply absent from the output, not an error.

mod audio;
mod video;

pub use audio::{
    decode_audio_timecodes, encode_frame_audio, DecodeMode, BITS_PER_FRAME,
    MIN_SLIDING_CONFIDENCE,
};
pub use video::{
    decode_video_frame, decode_video_timecodes, render_binary_strip, STRIP_MARGIN_PX, STRIP_ROWS,
    VIDEO_STRIP_CONFIDENCE,
};

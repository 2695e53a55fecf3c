//! Error types for the codec core.
//!
//! Only genuinely unprocessable input and internal invariant violations are
//! errors. "Nothing found" outcomes (no cycle locked, zero checksum-valid
//! frames) are empty results carrying a structured diagnostic instead, so
//! callers decide whether sparseness is acceptable.

use thiserror::Error;

/// Errors produced by the codec core.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Frame id does not fit the 24-bit payload.
    #[error("frame id {frame_id} exceeds the 24-bit range")]
    FrameIdOutOfRange { frame_id: u32 },

    /// A video frame is too small to carry the binary strip geometry.
    #[error("frame {index} is {width}x{height}, strip decoding needs at least {min_width}x{min_height}")]
    FrameTooSmall {
        index: u64,
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },

    /// Phase-length arithmetic or bit indexing produced an impossible value.
    /// This indicates a bug in the caller or the crate, not bad input.
    #[error("internal invariant violated: {what}")]
    Invariant { what: &'static str },
}

/// Type alias for codec results.
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_format_with_context() {
        let err = CodecError::FrameIdOutOfRange {
            frame_id: 20_000_000,
        };
        assert!(err.to_string().contains("20000000"));

        let err = CodecError::FrameTooSmall {
            index: 3,
            width: 64,
            height: 16,
            min_width: 112,
            min_height: 20,
        };
        assert!(err.to_string().contains("64x16"));
    }
}

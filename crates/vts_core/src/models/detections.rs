//! Detection and region types exchanged between decoder stages.

use serde::{Deserialize, Serialize};

/// One successful decode of a 32-bit frame record.
///
/// `position` is the stream position where the record was found: an audio
/// sample index for detections from the FSK decoder, a video frame index for
/// detections from the strip decoder. The `frame_id` has always passed
/// checksum validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimecodeDetection {
    /// Sample position (audio) or frame index (video).
    pub position: u64,
    /// Checksum-validated 24-bit frame id.
    pub frame_id: u32,
    /// Decode confidence in [0.0, 1.0].
    pub confidence: f64,
}

impl TimecodeDetection {
    /// The same detection shifted to an absolute stream position, for
    /// detections decoded from a slice that started at `origin`.
    pub fn offset_by(self, origin: u64) -> Self {
        Self {
            position: self.position + origin,
            ..self
        }
    }
}

/// The timecode phase of one locked cycle, as exact frame and sample ranges.
///
/// Both ranges are end-exclusive. The audio range always equals
/// `round(frame * samples_per_frame_exact)` at both edges, so the two views
/// describe the same wall-clock span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedRegion {
    pub video_frame_start: u64,
    pub video_frame_end: u64,
    pub audio_sample_start: u64,
    pub audio_sample_end: u64,
}

impl LockedRegion {
    /// Number of video frames in the region.
    pub fn frame_count(&self) -> u64 {
        self.video_frame_end - self.video_frame_start
    }

    /// Number of audio samples in the region.
    pub fn sample_count(&self) -> u64 {
        self.audio_sample_end - self.audio_sample_start
    }
}

//! Correlator result types.

use serde::{Deserialize, Serialize};

/// One paired video/audio detection of the same frame id.
///
/// `offset_seconds` is `audio_time - video_time`: positive means the audio
/// lags the video, negative means it leads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffsetMatch {
    pub frame_id: u32,
    pub video_time_seconds: f64,
    pub audio_time_seconds: f64,
    pub offset_seconds: f64,
    /// min(video confidence, audio confidence).
    pub confidence: f64,
}

/// Offset statistics over all matches.
///
/// Serialized field names are the stable report format; floats are IEEE-754
/// doubles. A zero `match_count` report has all statistics at 0.0 and is the
/// "no signal" outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetReport {
    pub mean_offset_seconds: f64,
    pub std_dev_seconds: f64,
    pub min_offset_seconds: f64,
    pub max_offset_seconds: f64,
    pub match_count: usize,
    pub mean_confidence: f64,
    /// Matches dropped by the optional 3-sigma refinement pass; zero when
    /// trimming is disabled.
    pub outliers_discarded: usize,
    pub matches: Vec<OffsetMatch>,
}

impl OffsetReport {
    /// An empty report (zero matches).
    pub fn empty() -> Self {
        Self {
            mean_offset_seconds: 0.0,
            std_dev_seconds: 0.0,
            min_offset_seconds: 0.0,
            max_offset_seconds: 0.0,
            match_count: 0,
            mean_confidence: 0.0,
            outliers_discarded: 0,
            matches: Vec::new(),
        }
    }
}

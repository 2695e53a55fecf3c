//! Format parameters and the 4-phase cycle structure.

use serde::{Deserialize, Serialize};

/// Broadcast video system the pattern targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoSystem {
    /// 25 fps, 720x576.
    Pal,
    /// 30000/1001 fps, 720x480.
    Ntsc,
}

impl std::fmt::Display for VideoSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoSystem::Pal => write!(f, "PAL"),
            VideoSystem::Ntsc => write!(f, "NTSC"),
        }
    }
}

/// Immutable format configuration shared by encoder and decoder.
///
/// The frame rate is stored as an exact rational. All sample positions are
/// derived from the rational per frame; pre-truncating samples-per-frame to
/// an integer and multiplying by the frame index accumulates into
/// multi-second audio drift over a 30 second timecode section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormatParams {
    /// Frame rate numerator (25 for PAL, 30000 for NTSC).
    pub fps_num: u32,
    /// Frame rate denominator (1 for PAL, 1001 for NTSC).
    pub fps_den: u32,
    /// Frame width in pixels.
    pub video_width: u32,
    /// Frame height in pixels.
    pub video_height: u32,
    /// Audio sample rate in Hz (mono).
    pub audio_sample_rate: u32,
}

impl FormatParams {
    /// PAL parameters: 25 fps exact, 720x576, 48 kHz mono.
    pub fn pal() -> Self {
        Self {
            fps_num: 25,
            fps_den: 1,
            video_width: 720,
            video_height: 576,
            audio_sample_rate: 48_000,
        }
    }

    /// NTSC parameters: 30000/1001 fps exact, 720x480, 48 kHz mono.
    pub fn ntsc() -> Self {
        Self {
            fps_num: 30_000,
            fps_den: 1001,
            video_width: 720,
            video_height: 480,
            audio_sample_rate: 48_000,
        }
    }

    /// Parameters for a video system.
    pub fn for_system(system: VideoSystem) -> Self {
        match system {
            VideoSystem::Pal => Self::pal(),
            VideoSystem::Ntsc => Self::ntsc(),
        }
    }

    /// Frame rate as a float (for time conversion, never for sample counts).
    pub fn fps(&self) -> f64 {
        self.fps_num as f64 / self.fps_den as f64
    }

    /// Exact audio samples per video frame as a float.
    ///
    /// 1920.0 for PAL, 1601.6 for NTSC. Must never be truncated to an
    /// integer before multiplying by a frame index.
    pub fn samples_per_frame_exact(&self) -> f64 {
        self.audio_sample_rate as f64 * self.fps_den as f64 / self.fps_num as f64
    }

    /// Audio sample index at which frame `frame` starts, relative to the
    /// stream origin: `round(frame * sample_rate / fps)`.
    ///
    /// Computed in integer arithmetic so the result is exact for any frame
    /// index; each frame is derived independently from the origin, so no
    /// rounding error accumulates.
    pub fn frame_start_sample(&self, frame: u64) -> u64 {
        let numer = frame as u128 * self.audio_sample_rate as u128 * self.fps_den as u128;
        let denom = self.fps_num as u128;
        ((2 * numer + denom) / (2 * denom)) as u64
    }

    /// Nearest video frame index to an audio sample position.
    pub fn sample_to_nearest_frame(&self, sample: u64) -> u64 {
        let numer = sample as u128 * self.fps_num as u128;
        let denom = self.audio_sample_rate as u128 * self.fps_den as u128;
        ((2 * numer + denom) / (2 * denom)) as u64
    }
}

/// One of the four phases of a test cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CyclePhase {
    /// Test chart picture with a 1 kHz reference tone.
    TestChart,
    /// Black picture, digital silence.
    PreSilence,
    /// Per-frame identifiers in both streams. The only phase decoders see.
    Timecode,
    /// Black picture, digital silence.
    PostSilence,
}

/// Phase lengths of one test cycle, in video frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStructure {
    pub test_chart_frames: u64,
    pub pre_silence_frames: u64,
    pub timecode_frames: u64,
    pub post_silence_frames: u64,
}

impl CycleStructure {
    /// The default PAL structure: 75 / 25 / 750 / 25 frames (3s/1s/30s/1s).
    pub fn pal() -> Self {
        Self {
            test_chart_frames: 75,
            pre_silence_frames: 25,
            timecode_frames: 750,
            post_silence_frames: 25,
        }
    }

    /// Structure for arbitrary format parameters, using the same wall-clock
    /// phase durations as PAL (3s / 1s / 30s / 1s) rounded to whole frames.
    pub fn for_format(params: &FormatParams) -> Self {
        let frames = |secs: f64| (secs * params.fps()).round() as u64;
        Self {
            test_chart_frames: frames(3.0),
            pre_silence_frames: frames(1.0),
            timecode_frames: frames(30.0),
            post_silence_frames: frames(1.0),
        }
    }

    /// Total frames in one cycle.
    pub fn frames_per_cycle(&self) -> u64 {
        self.test_chart_frames
            + self.pre_silence_frames
            + self.timecode_frames
            + self.post_silence_frames
    }

    /// Frame offset of the timecode phase within the cycle.
    pub fn timecode_offset_frames(&self) -> u64 {
        self.test_chart_frames + self.pre_silence_frames
    }

    /// Which phase a frame (indexed from the cycle start) falls in.
    pub fn phase_at(&self, frame_in_cycle: u64) -> CyclePhase {
        let mut f = frame_in_cycle % self.frames_per_cycle();
        if f < self.test_chart_frames {
            return CyclePhase::TestChart;
        }
        f -= self.test_chart_frames;
        if f < self.pre_silence_frames {
            return CyclePhase::PreSilence;
        }
        f -= self.pre_silence_frames;
        if f < self.timecode_frames {
            return CyclePhase::Timecode;
        }
        CyclePhase::PostSilence
    }
}

impl Default for CycleStructure {
    fn default() -> Self {
        Self::pal()
    }
}

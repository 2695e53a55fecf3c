//! Synchronized test-pattern generation.
//!
//! A cycle is four phases: test chart with a 1 kHz tone, black silence,
//! a timecode section carrying per-frame identifiers in both streams, and
//! black silence again. The generator drives caller-supplied callbacks with
//! one audio block and one pixel buffer per frame; writing files, muxing and
//! encoding are external.
//!
//! Timing is frame-boundary exact: the audio block for frame `k` spans
//! `[round(k * spf), round((k+1) * spf))` with every boundary derived
//! independently from the stream origin. Accumulating a pre-truncated
//! integer samples-per-frame instead drifts by whole seconds over one
//! timecode section.

mod frames;

pub use frames::{black_frame, test_chart_frame, timecode_frame};

use image::GrayImage;

use crate::dsp::ToneGenerator;
use crate::error::{CodecError, CodecResult};
use crate::framecodec::{encode_frame_audio, BITS_PER_FRAME};
use crate::models::{CycleStructure, FormatParams, FrameRecord, MAX_FRAME_ID};

/// Frequency of the test-chart reference tone.
pub const CHART_TONE_HZ: f64 = 1000.0;
/// Amplitude of both the reference tone and the FSK carrier.
pub const TONE_AMPLITUDE: f64 = 0.6;

/// Generator for the 4-phase test cycle.
pub struct PatternGenerator {
    params: FormatParams,
    structure: CycleStructure,
}

impl PatternGenerator {
    pub fn new(params: FormatParams, structure: CycleStructure) -> CodecResult<Self> {
        if structure.timecode_frames > MAX_FRAME_ID as u64 + 1 {
            return Err(CodecError::FrameIdOutOfRange {
                frame_id: structure.timecode_frames.saturating_sub(1) as u32,
            });
        }
        if structure.frames_per_cycle() == 0 {
            return Err(CodecError::Invariant {
                what: "cycle structure has zero frames",
            });
        }
        Ok(Self { params, structure })
    }

    pub fn params(&self) -> &FormatParams {
        &self.params
    }

    pub fn structure(&self) -> &CycleStructure {
        &self.structure
    }

    /// Emit one cycle through the callbacks, one frame at a time.
    ///
    /// `audio_out` receives the frame's audio block; `video_out` receives
    /// the frame's pixel buffer. Both are called exactly once per frame, in
    /// stream order. `cycle_index` positions the cycle in a longer stream so
    /// its first sample lands exactly where cycle boundaries fall.
    pub fn generate_cycle<A, V>(
        &self,
        cycle_index: u64,
        mut audio_out: A,
        mut video_out: V,
    ) -> CodecResult<()>
    where
        A: FnMut(&[f64]),
        V: FnMut(&GrayImage),
    {
        let (w, h) = (self.params.video_width, self.params.video_height);
        let chart = test_chart_frame(w, h);
        let black = black_frame(w, h);
        let samples_per_bit = self.params.samples_per_frame_exact() / BITS_PER_FRAME as f64;

        let mut frame = cycle_index * self.structure.frames_per_cycle();
        let mut block = Vec::new();

        // Test chart: one phase-continuous reference tone.
        let mut tone = ToneGenerator::new(self.params.audio_sample_rate, TONE_AMPLITUDE);
        for _ in 0..self.structure.test_chart_frames {
            self.resize_to_frame(frame, &mut block);
            tone.fill(CHART_TONE_HZ, &mut block);
            audio_out(&block);
            video_out(&chart);
            frame += 1;
        }

        // Pre-roll silence.
        for _ in 0..self.structure.pre_silence_frames {
            self.resize_to_frame(frame, &mut block);
            block.fill(0.0);
            audio_out(&block);
            video_out(&black);
            frame += 1;
        }

        // Timecode: both streams carry id = frame index within the phase.
        tone.reset();
        for k in 0..self.structure.timecode_frames {
            let record = FrameRecord::new(k as u32)?;
            let start = self.params.frame_start_sample(frame);
            let end = self.params.frame_start_sample(frame + 1);
            let audio = encode_frame_audio(
                &record,
                (end - start) as usize,
                samples_per_bit,
                &mut tone,
            );
            audio_out(&audio);
            video_out(&timecode_frame(&record, w, h));
            frame += 1;
        }

        // Post-roll silence.
        for _ in 0..self.structure.post_silence_frames {
            self.resize_to_frame(frame, &mut block);
            block.fill(0.0);
            audio_out(&block);
            video_out(&black);
            frame += 1;
        }

        Ok(())
    }

    /// Collect one cycle's audio into an owned buffer (video discarded).
    pub fn generate_cycle_audio(&self, cycle_index: u64) -> CodecResult<Vec<f64>> {
        let mut audio = Vec::new();
        self.generate_cycle(cycle_index, |block| audio.extend_from_slice(block), |_| {})?;
        Ok(audio)
    }

    fn resize_to_frame(&self, frame: u64, block: &mut Vec<f64>) {
        let len = self.params.frame_start_sample(frame + 1) - self.params.frame_start_sample(frame);
        block.resize(len as usize, 0.0);
    }
}

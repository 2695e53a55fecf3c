//! FSK serialization of frame records.
//!
//! One video frame's worth of audio carries 32 bits, MSB of the frame id
//! first, then the checksum MSB first. Bit boundaries inside a frame are
//! derived from the exact samples-per-bit float by per-bit rounding, never
//! by accumulating an integer width.

use tracing::debug;

use crate::bitcodec::{encode_bit, BitDecoder};
use crate::dsp::ToneGenerator;
use crate::models::{BitSymbol, FormatParams, FrameRecord, TimecodeDetection};

/// Wire bits per video frame: 24 id bits + 8 checksum bits.
pub const BITS_PER_FRAME: usize = 32;

/// Sliding-window candidates below this confidence are discarded; offsets
/// that straddle bit boundaries can assemble a checksum-valid word from
/// marginal bits, and those reads cluster well under this level.
pub const MIN_SLIDING_CONFIDENCE: f64 = 0.5;

/// Sliding step for tolerant decoding, as a fraction of one bit.
const SLIDE_STEP_DIVISOR: f64 = 8.0;

/// Decoder configuration for a section of audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Frame-perfect input (re-validating generated output): bits are read
    /// at exact boundaries only.
    Strict,
    /// Captured-from-tape input: exact boundaries plus a sliding family of
    /// offsets, to recover frames shifted by mechanical timing jitter.
    Tolerant,
}

/// Encode one frame record as FSK audio.
///
/// `frame_samples` is this frame's share of the stream (the caller derives
/// it by per-frame rounding from the section origin); `samples_per_bit` is
/// the exact float `samples_per_frame_exact / 32`. The tone generator
/// carries phase across bits and across frames within a section.
pub fn encode_frame_audio(
    record: &FrameRecord,
    frame_samples: usize,
    samples_per_bit: f64,
    tone: &mut ToneGenerator,
) -> Vec<f64> {
    let mut out = vec![0.0; frame_samples];
    for (i, bit) in record.to_bits().into_iter().enumerate() {
        let start = (i as f64 * samples_per_bit).round() as usize;
        let end = if i == BITS_PER_FRAME - 1 {
            frame_samples
        } else {
            (((i + 1) as f64 * samples_per_bit).round() as usize).min(frame_samples)
        };
        if end <= start {
            continue;
        }
        let block = encode_bit(BitSymbol::from_bit(bit), end - start, tone);
        out[start..end].copy_from_slice(&block);
    }
    out
}

/// Decode all frame records found in an audio section.
///
/// Positions in the returned detections are relative to the start of
/// `samples`; for a locked region, offset them by the region's
/// `audio_sample_start` before correlation. An empty or too-short input
/// yields an empty list.
pub fn decode_audio_timecodes(
    samples: &[f64],
    params: &FormatParams,
    mode: DecodeMode,
) -> Vec<TimecodeDetection> {
    let decoder = BitDecoder::new(params.audio_sample_rate);
    let samples_per_bit = params.samples_per_frame_exact() / BITS_PER_FRAME as f64;

    let mut detections = decode_exact_boundaries(samples, params, &decoder, samples_per_bit);
    debug!(
        count = detections.len(),
        mode = ?mode,
        "exact-boundary decode finished"
    );

    if mode == DecodeMode::Tolerant {
        let sliding = decode_sliding_windows(samples, params, &decoder, samples_per_bit);
        debug!(count = sliding.len(), "sliding-window decode finished");
        detections.extend(sliding);
        detections = merge_duplicates(detections, params.samples_per_frame_exact());
        detections = filter_shifted_word_reads(detections);
    }

    detections
}

/// Decode at exact frame boundaries derived from the section start.
fn decode_exact_boundaries(
    samples: &[f64],
    params: &FormatParams,
    decoder: &BitDecoder,
    samples_per_bit: f64,
) -> Vec<TimecodeDetection> {
    let mut detections = Vec::new();
    let mut frame = 0u64;
    loop {
        let start = params.frame_start_sample(frame) as usize;
        let end = params.frame_start_sample(frame + 1) as usize;
        if end > samples.len() {
            break;
        }
        if let Some((record, confidence)) =
            decode_frame_block(&samples[start..end], decoder, samples_per_bit)
        {
            detections.push(TimecodeDetection {
                position: start as u64,
                frame_id: record.frame_id(),
                confidence,
            });
        }
        frame += 1;
    }
    detections
}

/// Decode at sliding offsets to catch frames at non-nominal positions.
fn decode_sliding_windows(
    samples: &[f64],
    params: &FormatParams,
    decoder: &BitDecoder,
    samples_per_bit: f64,
) -> Vec<TimecodeDetection> {
    let frame_samples = params.samples_per_frame_exact().round() as usize;
    if samples.len() < frame_samples {
        return Vec::new();
    }
    let step = ((samples_per_bit / SLIDE_STEP_DIVISOR).round() as usize).max(1);

    let mut detections = Vec::new();
    let mut offset = 0usize;
    while offset + frame_samples <= samples.len() {
        if let Some((record, confidence)) =
            decode_frame_block(&samples[offset..offset + frame_samples], decoder, samples_per_bit)
        {
            if confidence > MIN_SLIDING_CONFIDENCE {
                detections.push(TimecodeDetection {
                    position: offset as u64,
                    frame_id: record.frame_id(),
                    confidence,
                });
            }
        }
        offset += step;
    }
    detections
}

/// Decode one frame-sized block into a checksum-valid record.
///
/// All 32 bits must decode; the confidence is the mean bit confidence.
fn decode_frame_block(
    block: &[f64],
    decoder: &BitDecoder,
    samples_per_bit: f64,
) -> Option<(FrameRecord, f64)> {
    let mut bits = [false; BITS_PER_FRAME];
    let mut confidence_sum = 0.0;

    for (i, bit) in bits.iter_mut().enumerate() {
        let start = (i as f64 * samples_per_bit).round() as usize;
        let end = if i == BITS_PER_FRAME - 1 {
            block.len()
        } else {
            (((i + 1) as f64 * samples_per_bit).round() as usize).min(block.len())
        };
        if end <= start {
            return None;
        }
        let decoded = decoder.decode(&block[start..end])?;
        *bit = decoded.symbol.as_bit();
        confidence_sum += decoded.confidence;
    }

    let record = FrameRecord::from_bits(&bits)?;
    Some((record, confidence_sum / BITS_PER_FRAME as f64))
}

/// Merge duplicate detections of the same underlying frame.
///
/// Two detections describe the same frame when they carry the same id and
/// sit within one frame length of each other; the higher-confidence one is
/// kept.
fn merge_duplicates(
    mut detections: Vec<TimecodeDetection>,
    samples_per_frame: f64,
) -> Vec<TimecodeDetection> {
    detections.sort_by_key(|d| d.position);
    let window = samples_per_frame.round() as u64;

    let mut merged: Vec<TimecodeDetection> = Vec::with_capacity(detections.len());
    for det in detections {
        let duplicate = merged
            .iter_mut()
            .rev()
            .take_while(|kept| det.position - kept.position < window)
            .find(|kept| kept.frame_id == det.frame_id);
        match duplicate {
            Some(kept) => {
                if det.confidence > kept.confidence {
                    *kept = det;
                }
            }
            None => merged.push(det),
        }
    }
    // Replacing a kept detection with a later, higher-confidence duplicate
    // can perturb ordering; restore it for downstream consumers.
    merged.sort_by_key(|d| d.position);
    merged
}

/// Drop shifted-word misreads.
///
/// A sliding window that lands a whole number of bit-widths into a frame
/// reads a bit-shifted word spanning two frames, and for some id pairs that
/// word still passes the checksum (ids 30,31 back to back forge id 120 two
/// bit-widths in). Within one decoded section true ids rise with position,
/// so the longest strictly-id-increasing chain of the position-sorted
/// detections keeps every true read and sheds the forgeries.
fn filter_shifted_word_reads(detections: Vec<TimecodeDetection>) -> Vec<TimecodeDetection> {
    let n = detections.len();
    if n <= 1 {
        return detections;
    }

    // Patience longest-increasing-subsequence over frame ids.
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        let id = detections[i].frame_id;
        let slot = tails.partition_point(|&j| detections[j].frame_id < id);
        if slot > 0 {
            prev[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut keep = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        keep.push(i);
        cursor = prev[i];
    }
    keep.reverse();

    if keep.len() < n {
        debug!(dropped = n - keep.len(), "discarded shifted-word reads");
    }
    keep.into_iter().map(|i| detections[i]).collect()
}

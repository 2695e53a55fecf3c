//! Binary-strip serialization of frame records in the picture.
//!
//! The top 20 rows of each timecode frame, between the 40-pixel corner
//! margins, hold 32 solid blocks: white for a one bit, black for a zero bit,
//! MSB of the frame id leftmost.

use image::GrayImage;

use crate::error::{CodecError, CodecResult};
use crate::models::{FrameRecord, TimecodeDetection};

/// Height of the binary strip in rows.
pub const STRIP_ROWS: u32 = 20;
/// Margin on each side reserved for corner sync markers.
pub const STRIP_MARGIN_PX: u32 = 40;
/// Confidence assigned to a checksum-valid strip decode.
pub const VIDEO_STRIP_CONFIDENCE: f64 = 0.90;

/// Luma threshold separating one blocks from zero blocks.
const BIT_THRESHOLD: u8 = 128;
/// Side length of the averaged sample patch at each block centre.
const SAMPLE_PATCH: u32 = 6;

const MIN_WIDTH: u32 = 2 * STRIP_MARGIN_PX + 32;

/// Paint the binary strip for `record` onto a frame.
///
/// Rows 0..20 between the margins are overwritten; the rest of the frame is
/// untouched.
pub fn render_binary_strip(record: &FrameRecord, frame: &mut GrayImage) {
    let width = frame.width();
    let usable = (width - 2 * STRIP_MARGIN_PX) as f64;
    let bits = record.to_bits();

    for (i, bit) in bits.iter().enumerate() {
        let x_start = STRIP_MARGIN_PX + (i as f64 * usable / 32.0).round() as u32;
        let x_end = STRIP_MARGIN_PX + ((i + 1) as f64 * usable / 32.0).round() as u32;
        let value = if *bit { 255 } else { 0 };
        for y in 0..STRIP_ROWS.min(frame.height()) {
            for x in x_start..x_end.min(width) {
                frame.put_pixel(x, y, image::Luma([value]));
            }
        }
    }
}

/// Read the binary strip of one frame.
///
/// Each block is read as the mean of a small patch centred on the block;
/// the mean is thresholded at 128. Returns `None` when the assembled word
/// fails checksum validation — a damaged frame is a normal outcome.
pub fn decode_video_frame(frame: &GrayImage) -> Option<FrameRecord> {
    if frame.width() < MIN_WIDTH || frame.height() < STRIP_ROWS {
        return None;
    }
    let usable = (frame.width() - 2 * STRIP_MARGIN_PX) as f64;

    let mut bits = [false; 32];
    for (i, bit) in bits.iter_mut().enumerate() {
        let centre_x = STRIP_MARGIN_PX as f64 + (i as f64 + 0.5) * usable / 32.0;
        let centre_y = STRIP_ROWS as f64 / 2.0;
        *bit = average_patch(frame, centre_x, centre_y) >= BIT_THRESHOLD as f64;
    }

    FrameRecord::from_bits(&bits)
}

/// Decode the strips of a frame sequence.
///
/// `first_frame_index` is the stream index of the first yielded frame (the
/// locked region's `video_frame_start`); detections carry absolute frame
/// indices. Frames too small for the strip geometry are an input error, not
/// a missed decode.
pub fn decode_video_timecodes<'a, I>(
    frames: I,
    first_frame_index: u64,
) -> CodecResult<Vec<TimecodeDetection>>
where
    I: IntoIterator<Item = &'a GrayImage>,
{
    let mut detections = Vec::new();
    for (i, frame) in frames.into_iter().enumerate() {
        let index = first_frame_index + i as u64;
        if frame.width() < MIN_WIDTH || frame.height() < STRIP_ROWS {
            return Err(CodecError::FrameTooSmall {
                index,
                width: frame.width(),
                height: frame.height(),
                min_width: MIN_WIDTH,
                min_height: STRIP_ROWS,
            });
        }
        if let Some(record) = decode_video_frame(frame) {
            detections.push(TimecodeDetection {
                position: index,
                frame_id: record.frame_id(),
                confidence: VIDEO_STRIP_CONFIDENCE,
            });
        }
    }
    Ok(detections)
}

/// Mean luma of a `SAMPLE_PATCH`-sided square centred at (cx, cy).
fn average_patch(frame: &GrayImage, cx: f64, cy: f64) -> f64 {
    let half = SAMPLE_PATCH as f64 / 2.0;
    let x0 = (cx - half).floor().max(0.0) as u32;
    let y0 = (cy - half).floor().max(0.0) as u32;
    let x1 = ((cx + half).ceil() as u32).min(frame.width());
    let y1 = ((cy + half).ceil() as u32).min(frame.height());

    let mut sum = 0u64;
    let mut count = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            sum += frame.get_pixel(x, y).0[0] as u64;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    sum as f64 / count as f64
}

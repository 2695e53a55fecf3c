//! Frame painting for the generator phases.

use image::GrayImage;

use crate::framecodec::render_binary_strip;
use crate::models::FrameRecord;

/// Luma carried by the top-left / bottom-right sync markers (red in the
/// original colour pattern).
const CORNER_PRIMARY_LUMA: u8 = 76;
/// Luma carried by the top-right / bottom-left sync markers (blue).
const CORNER_SECONDARY_LUMA: u8 = 29;
/// Side length of a corner sync marker.
const CORNER_SIZE: u32 = 40;

/// A solid black frame (both silence phases).
pub fn black_frame(width: u32, height: u32) -> GrayImage {
    GrayImage::new(width, height)
}

/// A high-contrast bar chart for the test-chart phase.
///
/// Eight vertical luminance steps from near-white to near-black; enough
/// picture energy for level calibration without external chart media.
pub fn test_chart_frame(width: u32, height: u32) -> GrayImage {
    const BAR_LEVELS: [u8; 8] = [235, 203, 171, 139, 107, 75, 43, 16];
    let mut frame = GrayImage::new(width, height);
    for (x, _, pixel) in frame.enumerate_pixels_mut() {
        let bar = (x as usize * BAR_LEVELS.len() / width.max(1) as usize).min(BAR_LEVELS.len() - 1);
        *pixel = image::Luma([BAR_LEVELS[bar]]);
    }
    frame
}

/// A timecode-phase frame: dark field, corner sync markers, binary strip.
pub fn timecode_frame(record: &FrameRecord, width: u32, height: u32) -> GrayImage {
    let mut frame = GrayImage::new(width, height);
    draw_corner_markers(&mut frame);
    render_binary_strip(record, &mut frame);
    frame
}

fn draw_corner_markers(frame: &mut GrayImage) {
    let (w, h) = frame.dimensions();
    let size = CORNER_SIZE.min(w / 2).min(h / 2);
    fill_rect(frame, 0, 0, size, size, CORNER_PRIMARY_LUMA);
    fill_rect(frame, w - size, h - size, w, h, CORNER_PRIMARY_LUMA);
    fill_rect(frame, w - size, 0, w, size, CORNER_SECONDARY_LUMA);
    fill_rect(frame, 0, h - size, size, h, CORNER_SECONDARY_LUMA);
}

fn fill_rect(frame: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, value: u8) {
    for y in y0..y1 {
        for x in x0..x1 {
            frame.put_pixel(x, y, image::Luma([value]));
        }
    }
}

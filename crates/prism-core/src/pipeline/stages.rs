//! Frame-level transform stages.
//!
//! Every stage mutates the canvas in place and applies to all frames, so an
//! animation stays consistent. Each rebuilt frame is positioned at the
//! origin with the new dimensions as its logical page.

use image::imageops::{self, FilterType};
use image::{Delay, Frame, RgbaImage};

use super::decode::Canvas;
use super::geometry::{crop_window, resize_dimensions};
use crate::trace::Trace;
use crate::types::{AnimationMode, CropRect};

/// Frames kept by the preview animation mode.
const PREVIEW_FRAMES: usize = 5;

/// Per-frame delay of a preview animation.
const PREVIEW_DELAY_MS: u32 = 1500;

/// Reduce animated content according to the `am` directive.
pub fn apply_animation(canvas: &mut Canvas, mode: AnimationMode, trace: &Trace) {
    if !canvas.is_animated() {
        return;
    }
    match mode {
        AnimationMode::Unset => {}
        AnimationMode::Still => {
            canvas.frames.truncate(1);
            trace.note("animation: still, kept first frame");
        }
        AnimationMode::Preview => {
            let total = canvas.frames.len();
            let keep = total.min(PREVIEW_FRAMES);
            let delay = Delay::from_numer_denom_ms(PREVIEW_DELAY_MS, 1);
            let frames = std::mem::take(&mut canvas.frames);
            canvas.frames = frames
                .into_iter()
                .enumerate()
                .filter(|(index, _)| is_sampled(*index, total, keep))
                .map(|(_, frame)| Frame::from_parts(frame.into_buffer(), 0, 0, delay))
                .collect();
            trace.note(format!("animation: preview, {keep} of {total} frames"));
        }
    }
}

/// Whether frame `index` is one of `keep` evenly spaced samples of `total`.
fn is_sampled(index: usize, total: usize, keep: usize) -> bool {
    (0..keep).any(|slot| slot * total / keep == index)
}

/// Crop every frame. Inactive rectangles are a no-op.
pub fn crop(canvas: &mut Canvas, rect: &CropRect, center: bool, trace: &Trace) {
    if !rect.is_active() {
        return;
    }
    let Some(window) = crop_window(canvas.dimensions(), rect, center) else {
        tracing::warn!(?rect, "Crop window lies outside the frame, skipping crop");
        trace.note("crop: window outside frame, skipped");
        return;
    };

    for frame in canvas.frames.iter_mut() {
        let delay = frame.delay();
        let cropped =
            imageops::crop_imm(frame.buffer(), window.x, window.y, window.width, window.height)
                .to_image();
        *frame = Frame::from_parts(cropped, 0, 0, delay);
    }
    trace.note(format!(
        "crop: {}x{} at {},{}",
        window.width, window.height, window.x, window.y
    ));
}

/// Resize every frame. Inactive when both dimensions are zero.
pub fn resize(canvas: &mut Canvas, width: u32, height: u32, trace: &Trace) {
    if width == 0 && height == 0 {
        return;
    }
    let (target_w, target_h) = resize_dimensions(canvas.dimensions(), width, height);

    for frame in canvas.frames.iter_mut() {
        let delay = frame.delay();
        let resized = imageops::resize(frame.buffer(), target_w, target_h, FilterType::Lanczos3);
        *frame = Frame::from_parts(resized, 0, 0, delay);
    }
    trace.note(format!("resize: {target_w}x{target_h}"));
}

/// Stretch each colour channel to the full 0 to 255 range.
///
/// Skipped for animated content; alpha is left untouched.
pub fn normalize(canvas: &mut Canvas, trace: &Trace) {
    if canvas.is_animated() {
        trace.note("normalize: skipped for animated content");
        return;
    }
    if let Some(frame) = canvas.frames.first_mut() {
        stretch_channels(frame.buffer_mut());
        trace.note("normalize: contrast stretched");
    }
}

fn stretch_channels(buffer: &mut RgbaImage) {
    let mut low = [u8::MAX; 3];
    let mut high = [u8::MIN; 3];
    for pixel in buffer.pixels() {
        for channel in 0..3 {
            low[channel] = low[channel].min(pixel[channel]);
            high[channel] = high[channel].max(pixel[channel]);
        }
    }

    for pixel in buffer.pixels_mut() {
        for channel in 0..3 {
            let span = u32::from(high[channel] - low[channel]);
            if span == 0 {
                continue;
            }
            let value = u32::from(pixel[channel] - low[channel]);
            pixel[channel] = (value * 255 / span) as u8;
        }
    }
}

/// Drop embedded profiles and metadata before encoding.
pub fn strip(canvas: &mut Canvas, trace: &Trace) {
    if canvas.icc_profile.take().is_some() {
        trace.note("strip: removed ICC profile");
    }
}

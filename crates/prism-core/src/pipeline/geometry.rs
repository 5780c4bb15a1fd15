//! Pure dimension arithmetic for the crop and resize stages.
//!
//! Ratios are integer percentages, truncated, so repeated requests always
//! produce the same pixel sizes.

use crate::types::CropRect;

/// A crop window inside a frame, already clipped to the frame bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the crop window for a frame.
///
/// With `center` the offset is `((frame - crop) / 2)` on each axis, which can
/// be negative when the crop is larger than the frame. The requested
/// rectangle is intersected with the frame; `None` means nothing overlaps.
pub fn crop_window(frame: (u32, u32), crop: &CropRect, center: bool) -> Option<Window> {
    let (frame_w, frame_h) = (i64::from(frame.0), i64::from(frame.1));
    let (crop_w, crop_h) = (i64::from(crop.width), i64::from(crop.height));

    let (x, y) = if center {
        ((frame_w - crop_w) / 2, (frame_h - crop_h) / 2)
    } else {
        (i64::from(crop.x), i64::from(crop.y))
    };

    let left = x.max(0);
    let top = y.max(0);
    let right = (x + crop_w).min(frame_w);
    let bottom = (y + crop_h).min(frame_h);
    if right <= left || bottom <= top {
        return None;
    }

    Some(Window {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

/// Aspect ratio as a truncated percentage: `floor(w / h * 100)`.
pub fn ratio_percent(width: u32, height: u32) -> u64 {
    if height == 0 {
        return 0;
    }
    u64::from(width) * 100 / u64::from(height)
}

/// Output size of the resize stage.
///
/// Both dimensions given: exactly those. One given: the other follows the
/// frame's aspect ratio (`given * ratio / 100` or `given * 100 / ratio`).
/// Frames narrower than 1:100 truncate the ratio to zero; those scale by
/// the exact frame dimensions instead. Results are at least 1px.
pub fn resize_dimensions(frame: (u32, u32), width: u32, height: u32) -> (u32, u32) {
    let (frame_w, frame_h) = (u64::from(frame.0), u64::from(frame.1.max(1)));
    let ratio = ratio_percent(frame.0, frame.1);

    let (w, h) = match (width, height) {
        (0, 0) => (frame_w, frame_h),
        (w, 0) if ratio == 0 => (u64::from(w), u64::from(w) * frame_h / frame_w.max(1)),
        (w, 0) => (u64::from(w), u64::from(w) * 100 / ratio),
        (0, h) => (u64::from(h) * ratio / 100, u64::from(h)),
        (w, h) => (u64::from(w), u64::from(h)),
    };

    (clamp_dim(w), clamp_dim(h))
}

fn clamp_dim(value: u64) -> u32 {
    value.clamp(1, u64::from(u32::MAX)) as u32
}

//! Watermark geometry: scaled size and anchor position.
//!
//! The watermark is always scaled proportionally to a fraction of the base
//! width and anchored flush against the right edge, vertically centered.
//!
//! # Example
//!
//! ```
//! use inkstamp::watermark::position::{
//!     right_center_anchor, scaled_watermark_dimensions, ImageDimensions, WatermarkDimensions,
//! };
//!
//! let image = ImageDimensions { width: 600, height: 400 };
//! let source = WatermarkDimensions { width: 400, height: 100 };
//!
//! let scaled = scaled_watermark_dimensions(image.width, &source, 0.6);
//! assert_eq!((scaled.width, scaled.height), (360, 90));
//!
//! let anchor = right_center_anchor(&image, &scaled);
//! assert_eq!((anchor.x, anchor.y), (240, 155));
//! ```

/// Largest side a scaled watermark may have.
pub const MAX_WATERMARK_SIDE: u32 = u16::MAX as u32;

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of the watermark to be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

/// Top-left corner of a placed watermark. May be negative when the
/// watermark is taller than the image; the paste clips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Size of the watermark after uniform scaling to `ratio * base_width`.
///
/// Each side is rounded and clamped to at least one pixel, so tiny base
/// images still get a (degenerate) watermark instead of a zero-sized one.
pub fn scaled_watermark_dimensions(
    base_width: u32,
    watermark: &WatermarkDimensions,
    ratio: f32,
) -> WatermarkDimensions {
    if watermark.width == 0 || watermark.height == 0 {
        return WatermarkDimensions {
            width: 1,
            height: 1,
        };
    }

    let target_width = base_width as f64 * ratio as f64;
    let scale = target_width / watermark.width as f64;

    let scaled = |side: u32| -> u32 { (side as f64 * scale).round().max(1.0) as u32 };

    WatermarkDimensions {
        width: scaled(watermark.width),
        height: scaled(watermark.height),
    }
}

/// Anchor with the right edges flush and the watermark vertically centered.
///
/// Uses floor division, so an overhang above and below is split evenly with
/// the extra pixel going to the top.
pub fn right_center_anchor(
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> PlacementPosition {
    let img_w = image.width as i32;
    let img_h = image.height as i32;
    let wm_w = watermark.width as i32;
    let wm_h = watermark.height as i32;

    PlacementPosition::new(img_w - wm_w, (img_h - wm_h).div_euclid(2))
}

/// Check if a placed watermark overlaps the image at all.
pub fn is_visible(
    position: &PlacementPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> bool {
    let wm_right = position.x + watermark.width as i32;
    let wm_bottom = position.y + watermark.height as i32;

    wm_right > 0
        && wm_bottom > 0
        && position.x < image.width as i32
        && position.y < image.height as i32
}

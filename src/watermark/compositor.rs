//! Watermark compositor for blending a watermark onto an image.
//!
//! The steps are fixed:
//!
//! 1. Scale the watermark uniformly to `width_ratio` of the base width (Lanczos3)
//! 2. Scale its alpha by `opacity`
//! 3. Paste it, masked by its own alpha, onto a transparent canvas the size
//!    of the base, right edge flush and vertically centered
//! 4. Composite the canvas over the base with the Porter-Duff "over" operator
//!
//! # Example
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use inkstamp::watermark::compositor::{composite, CompositeOptions};
//!
//! let base = RgbaImage::from_pixel(600, 400, Rgba([0, 0, 0, 255]));
//! let logo = RgbaImage::from_pixel(400, 100, Rgba([255, 255, 255, 255]));
//!
//! let result = composite(&base, &logo, &CompositeOptions::default()).unwrap();
//! assert_eq!(result.dimensions(), base.dimensions());
//! ```

use super::opacity::adjust_opacity;
use super::position::{
    is_visible, right_center_anchor, scaled_watermark_dimensions, ImageDimensions,
    PlacementPosition, WatermarkDimensions, MAX_WATERMARK_SIDE,
};
use crate::error::ProcessingError;
use crate::image_optimizer::resize::{resize_rgba, FilterType};
use image::{Rgba, RgbaImage};

/// Scale and opacity applied to the watermark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeOptions {
    /// Watermark width as a fraction of the base width.
    pub width_ratio: f32,
    /// Opacity to apply (0.0 to 1.0) on top of the watermark's own alpha.
    pub opacity: f32,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            width_ratio: 0.6,
            opacity: 0.5,
        }
    }
}

/// Composite `watermark` onto `base`, returning a new image the size of `base`.
///
/// Neither input is modified.
pub fn composite(
    base: &RgbaImage,
    watermark: &RgbaImage,
    options: &CompositeOptions,
) -> Result<RgbaImage, ProcessingError> {
    if base.width() == 0 || base.height() == 0 || watermark.width() == 0 || watermark.height() == 0
    {
        return Ok(base.clone());
    }

    let scaled = scale_watermark(watermark, base.width(), options.width_ratio)?;
    let faded = adjust_opacity(&scaled, options.opacity);

    let image_dims = ImageDimensions {
        width: base.width(),
        height: base.height(),
    };
    let wm_dims = WatermarkDimensions {
        width: faded.width(),
        height: faded.height(),
    };
    let anchor = right_center_anchor(&image_dims, &wm_dims);

    tracing::trace!(
        watermark_width = wm_dims.width,
        watermark_height = wm_dims.height,
        x = anchor.x,
        y = anchor.y,
        "Placing watermark"
    );

    let overlay = build_overlay(&image_dims, &faded, anchor);
    Ok(alpha_composite(base, &overlay))
}

/// Resize the watermark proportionally to `ratio * base_width`.
pub fn scale_watermark(
    watermark: &RgbaImage,
    base_width: u32,
    ratio: f32,
) -> Result<RgbaImage, ProcessingError> {
    let source = WatermarkDimensions {
        width: watermark.width(),
        height: watermark.height(),
    };
    let target = scaled_watermark_dimensions(base_width, &source, ratio);
    if target.width > MAX_WATERMARK_SIDE || target.height > MAX_WATERMARK_SIDE {
        return Err(ProcessingError::resize(format!(
            "scaled watermark {}x{} exceeds {} pixels per side",
            target.width, target.height, MAX_WATERMARK_SIDE
        )));
    }
    resize_rgba(watermark, target.width, target.height, FilterType::Lanczos3)
}

/// Fully transparent canvas of `size` with `watermark` pasted at `position`.
pub fn build_overlay(
    size: &ImageDimensions,
    watermark: &RgbaImage,
    position: PlacementPosition,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(size.width, size.height);
    paste_with_mask(&mut canvas, watermark, position);
    canvas
}

/// Paste `source` onto `canvas`, using the source alpha as the blend mask.
///
/// Every channel, alpha included, becomes `src * m + dst * (1 - m)`. The
/// parts of `source` that fall outside the canvas are clipped.
fn paste_with_mask(canvas: &mut RgbaImage, source: &RgbaImage, position: PlacementPosition) {
    let canvas_dims = ImageDimensions {
        width: canvas.width(),
        height: canvas.height(),
    };
    let source_dims = WatermarkDimensions {
        width: source.width(),
        height: source.height(),
    };
    if !is_visible(&position, &canvas_dims, &source_dims) {
        return;
    }

    let canvas_width = canvas.width() as i32;
    let canvas_height = canvas.height() as i32;

    let x_start = position.x.max(0);
    let y_start = position.y.max(0);
    let x_end = (position.x + source.width() as i32).min(canvas_width);
    let y_end = (position.y + source.height() as i32).min(canvas_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let src = source.get_pixel((tx - position.x) as u32, (ty - position.y) as u32);
            let mask = src[3];
            let dst = canvas.get_pixel_mut(tx as u32, ty as u32);
            for channel in 0..4 {
                dst[channel] = blend_masked(src[channel], dst[channel], mask);
            }
        }
    }
}

fn blend_masked(src: u8, dst: u8, mask: u8) -> u8 {
    let m = mask as u32;
    ((src as u32 * m + dst as u32 * (255 - m) + 127) / 255) as u8
}

/// Composite `foreground` over `background`, pixel by pixel.
///
/// Both images must have the same dimensions.
pub fn alpha_composite(background: &RgbaImage, foreground: &RgbaImage) -> RgbaImage {
    debug_assert_eq!(background.dimensions(), foreground.dimensions());

    let mut result = background.clone();
    for (out, fg) in result.pixels_mut().zip(foreground.pixels()) {
        *out = blend_pixels(*out, *fg);
    }
    result
}

/// Blend two pixels using the "over" operator.
///
/// `out_a = fg_a + bg_a * (1 - fg_a)`,
/// `out_c = (fg_c * fg_a + bg_c * bg_a * (1 - fg_a)) / out_a`
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    match foreground[3] {
        0 => return background,
        255 => return foreground,
        _ => {}
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let result = (fg as f32 * fg_alpha + bg as f32 * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        result.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

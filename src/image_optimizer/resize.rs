//! Resampling helpers built on fast-image-resize
//!
//! All resizes run in premultiplied alpha so transparent pixels do not bleed
//! their (meaningless) color into visible neighbours.

use fast_image_resize as fr;
use image::RgbaImage;
use std::num::NonZeroU32;

use crate::error::ProcessingError;

pub use fast_image_resize::FilterType;

/// Resize an RGBA image to exactly `target_w` x `target_h`
///
/// Returns a new image; the input is untouched.
pub fn resize_rgba(
    img: &RgbaImage,
    target_w: u32,
    target_h: u32,
    filter: FilterType,
) -> Result<RgbaImage, ProcessingError> {
    if img.dimensions() == (target_w, target_h) {
        return Ok(img.clone());
    }

    let src_width = NonZeroU32::new(img.width())
        .ok_or_else(|| ProcessingError::resize("Source width is 0"))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| ProcessingError::resize("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ProcessingError::resize("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| ProcessingError::resize("Target height is 0"))?;

    let mut src_image = fr::Image::from_vec_u8(
        src_width,
        src_height,
        img.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| ProcessingError::resize(format!("Failed to create source image: {:?}", e)))?;

    let alpha_mul_div = fr::MulDiv::default();
    alpha_mul_div
        .multiply_alpha_inplace(&mut src_image.view_mut())
        .map_err(|e| ProcessingError::resize(format!("Failed to premultiply alpha: {:?}", e)))?;

    let mut dst_image = fr::Image::new(dst_width, dst_height, fr::PixelType::U8x4);
    let mut dst_view = dst_image.view_mut();

    let mut resizer = fr::Resizer::new(fr::ResizeAlg::Convolution(filter));
    resizer
        .resize(&src_image.view(), &mut dst_view)
        .map_err(|e| ProcessingError::resize(format!("Resize operation failed: {:?}", e)))?;

    alpha_mul_div
        .divide_alpha_inplace(&mut dst_view)
        .map_err(|e| ProcessingError::resize(format!("Failed to unpremultiply alpha: {:?}", e)))?;

    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| ProcessingError::resize("Failed to create output image buffer"))
}

/// Dimensions that fit within `max_dimension` on both axes, preserving aspect ratio
///
/// Images already within the bound are returned unchanged; this never enlarges.
pub fn bounded_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let bound = max_dimension as f64;
    let scale = (bound / width as f64).min(bound / height as f64);

    let scaled = |side: u32| -> u32 {
        ((side as f64 * scale).round() as u32).clamp(1, max_dimension.max(1))
    };

    (scaled(width), scaled(height))
}

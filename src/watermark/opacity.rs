//! Opacity adjustment for RGBA images.

use image::RgbaImage;

/// Return a copy of `image` with every alpha sample scaled by `factor`.
///
/// Color channels are untouched. Factors outside `0.0..=1.0` are not
/// rejected; the scaled alpha saturates at 0 and 255.
pub fn adjust_opacity(image: &RgbaImage, factor: f32) -> RgbaImage {
    let mut adjusted = image.clone();
    for pixel in adjusted.pixels_mut() {
        pixel[3] = scale_alpha(pixel[3], factor);
    }
    adjusted
}

fn scale_alpha(alpha: u8, factor: f32) -> u8 {
    (alpha as f32 * factor).round().clamp(0.0, 255.0) as u8
}

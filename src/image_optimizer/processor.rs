//! Image processing implementation
//!
//! Handles the whole transformation of one upload:
//! decode → RGBA → bounding resize → watermark → flatten → encode

use image::io::Reader as ImageReader;
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;

use super::encoder::{EncoderQuality, ImageEncoder, JpegEncoder};
use super::resize::{bounded_dimensions, resize_rgba, FilterType};
use crate::config::ProcessingConfig;
use crate::error::ProcessingError;
use crate::watermark::{composite, CompositeOptions, WatermarkAsset};

/// Fixed pipeline parameters for one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub max_dimension: u32,
    pub watermark_ratio: f32,
    pub opacity: f32,
    pub jpeg_quality: u8,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&ProcessingConfig::default())
    }
}

impl From<&ProcessingConfig> for PipelineSettings {
    fn from(config: &ProcessingConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
            watermark_ratio: config.watermark_ratio,
            opacity: config.opacity,
            jpeg_quality: config.jpeg_quality,
        }
    }
}

/// Result of image processing
#[derive(Debug)]
pub struct ProcessedImage {
    /// The encoded image data
    pub data: Vec<u8>,
    /// Content-Type header value
    pub content_type: &'static str,
    /// File extension for the destination key
    pub extension: &'static str,
    /// Decoded input dimensions (width, height)
    pub original_size: (u32, u32),
    /// Output dimensions (width, height)
    pub output_size: (u32, u32),
}

/// Decode → watermark → encode, with no state kept between runs
#[derive(Debug, Clone, Default)]
pub struct ImagePipeline {
    settings: PipelineSettings,
    encoder: JpegEncoder,
}

impl ImagePipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            encoder: JpegEncoder,
        }
    }

    /// Process raw upload bytes into the encoded, watermarked output
    pub fn process(
        &self,
        data: &[u8],
        watermark: &WatermarkAsset,
    ) -> Result<ProcessedImage, ProcessingError> {
        let decoded = decode_image(data)?;
        let original_size = (decoded.width(), decoded.height());

        let rgba = decoded.to_rgba8();
        let resized = thumbnail(&rgba, self.settings.max_dimension)?;

        let options = CompositeOptions {
            width_ratio: self.settings.watermark_ratio,
            opacity: self.settings.opacity,
        };
        let composited = composite(&resized, watermark.image(), &options)?;

        let flattened = flatten(&composited);
        let output_size = flattened.dimensions();

        let encoded = self.encoder.encode(
            &flattened,
            EncoderQuality::with_quality(self.settings.jpeg_quality),
        )?;

        tracing::debug!(
            original_width = original_size.0,
            original_height = original_size.1,
            output_width = output_size.0,
            output_height = output_size.1,
            input_bytes = data.len(),
            output_bytes = encoded.data.len(),
            "Image pipeline completed"
        );

        Ok(ProcessedImage {
            data: encoded.data,
            content_type: encoded.content_type,
            extension: encoded.extension,
            original_size,
            output_size,
        })
    }
}

/// Decode image data into a DynamicImage
pub fn decode_image(data: &[u8]) -> Result<DynamicImage, ProcessingError> {
    if data.is_empty() {
        return Err(ProcessingError::decode("image data is empty"));
    }

    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ProcessingError::decode(e.to_string()))?
        .decode()
        .map_err(|e| ProcessingError::decode(e.to_string()))
}

/// Shrink an image to fit within `max_dimension`, preserving aspect ratio
///
/// Images already within the bound are returned as an unchanged copy.
pub fn thumbnail(image: &RgbaImage, max_dimension: u32) -> Result<RgbaImage, ProcessingError> {
    let (width, height) = bounded_dimensions(image.width(), image.height(), max_dimension);
    resize_rgba(image, width, height, FilterType::CatmullRom)
}

/// Drop the alpha channel, compositing any partial transparency over white
pub fn flatten(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y);
        let alpha = px[3] as u32;
        let over_white = |c: u8| -> u8 {
            ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([over_white(px[0]), over_white(px[1]), over_white(px[2])])
    })
}

//! Image encoder abstraction
//!
//! The pipeline produces an opaque RGB image and hands it to an encoder;
//! the encoder decides the byte format, content type and file extension of
//! the stored object.

use image::RgbImage;

use crate::error::ProcessingError;

/// Quality settings for lossy encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderQuality {
    /// Quality value (1-100, where 100 is best quality)
    pub quality: u8,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self { quality: 75 }
    }
}

impl EncoderQuality {
    /// Create quality settings with specified quality level
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

/// Result of encoding an image
#[derive(Debug)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    /// Content-Type header value
    pub content_type: &'static str,
    /// File extension for destination keys, without the dot
    pub extension: &'static str,
}

/// Trait for image encoders
pub trait ImageEncoder: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn extension(&self) -> &'static str;

    /// Encode an opaque RGB image
    fn encode(
        &self,
        image: &RgbImage,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ProcessingError>;
}

/// JPEG encoder using the image crate
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn content_type(&self) -> &'static str {
        "image/jpeg"
    }

    fn extension(&self) -> &'static str {
        "jpg"
    }

    fn encode(
        &self,
        image: &RgbImage,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ProcessingError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
        use image::ImageEncoder as _;
        use std::io::Cursor;

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageJpegEncoder::new_with_quality(&mut output, quality.quality);

        encoder
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgb8,
            )
            .map_err(|e| ProcessingError::encode(format!("jpeg: {}", e)))?;

        Ok(EncodedImage {
            data: output.into_inner(),
            content_type: self.content_type(),
            extension: self.extension(),
        })
    }
}

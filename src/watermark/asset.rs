//! Watermark asset loading.
//!
//! The watermark lives at a fixed location outside of object storage and is
//! read fresh for every invocation. Nothing is cached between runs.
//!
//! # Sources
//!
//! - [`FileWatermarkSource`] reads a file from the local filesystem
//! - [`StaticWatermarkSource`] serves bytes held in memory (tests, embedding)

use async_trait::async_trait;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::position::WatermarkDimensions;
use crate::error::ProcessingError;

/// Location of the watermark when nothing else is configured.
pub const DEFAULT_WATERMARK_PATH: &str = "/opt/resources/watermark.png";

/// A decoded watermark, normalised to 8-bit RGBA.
#[derive(Debug, Clone)]
pub struct WatermarkAsset {
    image: RgbaImage,
}

impl WatermarkAsset {
    /// Decode watermark bytes. `name` is only used as a format hint when the
    /// magic bytes are not recognised.
    pub fn decode(data: &[u8], name: &str) -> Result<Self, ProcessingError> {
        if data.is_empty() {
            return Err(ProcessingError::decode(format!(
                "watermark {name} is empty"
            )));
        }

        let format = detect_image_format(data, name)?;
        let decoded = image::load(Cursor::new(data), format).map_err(|e| {
            ProcessingError::decode(format!("failed to decode watermark {name}: {e}"))
        })?;

        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ProcessingError::decode(format!(
                "watermark {name} has zero dimensions"
            )));
        }

        Ok(Self {
            image: decoded.to_rgba8(),
        })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> WatermarkDimensions {
        WatermarkDimensions {
            width: self.image.width(),
            height: self.image.height(),
        }
    }
}

/// Where the raw watermark bytes come from.
#[async_trait]
pub trait WatermarkSource: Send + Sync {
    /// Read the raw watermark bytes. A missing asset is a
    /// [`ProcessingError::WatermarkMissing`].
    async fn load_watermark(&self) -> Result<Vec<u8>, ProcessingError>;

    /// Human readable location, used in logs and as the format hint.
    fn location(&self) -> String;
}

/// Watermark read from a file on every call.
#[derive(Debug, Clone)]
pub struct FileWatermarkSource {
    path: PathBuf,
}

impl FileWatermarkSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileWatermarkSource {
    fn default() -> Self {
        Self::new(DEFAULT_WATERMARK_PATH)
    }
}

#[async_trait]
impl WatermarkSource for FileWatermarkSource {
    async fn load_watermark(&self) -> Result<Vec<u8>, ProcessingError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| ProcessingError::watermark_missing(self.location(), e.to_string()))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Watermark bytes held in memory. Counts how often it was read.
#[derive(Debug)]
pub struct StaticWatermarkSource {
    name: String,
    bytes: Vec<u8>,
    loads: AtomicUsize,
}

impl StaticWatermarkSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            loads: AtomicUsize::new(0),
        }
    }

    /// Number of times [`WatermarkSource::load_watermark`] was called.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WatermarkSource for StaticWatermarkSource {
    async fn load_watermark(&self) -> Result<Vec<u8>, ProcessingError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes.clone())
    }

    fn location(&self) -> String {
        self.name.clone()
    }
}

/// Detect image format from bytes or filename extension.
fn detect_image_format(data: &[u8], name: &str) -> Result<ImageFormat, ProcessingError> {
    // Magic bytes win over the extension
    if let Ok(format) = image::guess_format(data) {
        return Ok(format);
    }

    let ext = name
        .rsplit('.')
        .next()
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "gif" => Ok(ImageFormat::Gif),
        "webp" => Ok(ImageFormat::WebP),
        _ => Err(ProcessingError::decode(format!(
            "unsupported watermark format: {name}"
        ))),
    }
}

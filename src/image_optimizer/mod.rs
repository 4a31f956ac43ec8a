//! Image pipeline
//!
//! Turns the raw bytes of an uploaded image into the published derivative:
//!
//! 1. Decode any supported raster format (JPEG, PNG, WebP, GIF)
//! 2. Normalise to 8-bit RGBA
//! 3. Shrink to fit a bounding box (never enlarges)
//! 4. Composite the watermark
//! 5. Flatten to opaque RGB
//! 6. Encode as JPEG
//!
//! Every step returns a new image; nothing is mutated in place and nothing is
//! kept between runs.

pub mod encoder;
pub mod processor;
pub mod resize;

pub use encoder::{EncodedImage, EncoderQuality, ImageEncoder, JpegEncoder};
pub use processor::{
    decode_image, flatten, thumbnail, ImagePipeline, PipelineSettings, ProcessedImage,
};
pub use resize::{bounded_dimensions, resize_rgba, FilterType};

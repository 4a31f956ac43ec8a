//! Watermark module for stamping a logo onto processed images.
//!
//! A single image watermark is applied to every output:
//!
//! - scaled to a fixed fraction of the base width
//! - alpha multiplied by a fixed opacity
//! - anchored at the right edge, vertically centered
//!
//! The asset is loaded through a [`WatermarkSource`] on every invocation and
//! decoded into a [`WatermarkAsset`].

pub mod asset;
pub mod compositor;
pub mod opacity;
pub mod position;

// Re-export main types for convenience
pub use asset::{
    FileWatermarkSource, StaticWatermarkSource, WatermarkAsset, WatermarkSource,
    DEFAULT_WATERMARK_PATH,
};
pub use compositor::{alpha_composite, build_overlay, composite, scale_watermark, CompositeOptions};
pub use opacity::adjust_opacity;
pub use position::{
    is_visible, right_center_anchor, scaled_watermark_dimensions, ImageDimensions,
    PlacementPosition, WatermarkDimensions, MAX_WATERMARK_SIDE,
};

// Inkstamp watermark pipeline library

pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod image_optimizer;
pub mod logging;
pub mod metrics;
pub mod s3;
pub mod watermark;

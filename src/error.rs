// Error types module

use crate::s3::StoreError;

/// Centralized error type for a single processing invocation
///
/// Pipeline errors are terminal for the invocation: nothing is retried
/// internally and no partial result is ever stored.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    /// The object named by the trigger event does not exist
    #[error("Object {key} not found in {bucket}")]
    SourceNotFound { bucket: String, key: String },

    /// The trigger event is malformed or does not reference exactly one object
    #[error("Invalid trigger event: {0}")]
    InvalidEvent(String),

    /// Input bytes are not a recognised raster format
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The watermark asset could not be found at its fixed location
    #[error("Watermark not found at {path}: {reason}")]
    WatermarkMissing { path: String, reason: String },

    #[error("Resize failed: {0}")]
    Resize(String),

    /// Serialising the output image failed
    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProcessingError {
    /// Maps processing errors to the status code of the invocation outcome
    ///
    /// Only a missing source object is reported as 404; every other failure
    /// is a 500.
    pub fn status_code(&self) -> u16 {
        match self {
            ProcessingError::SourceNotFound { .. } => 404,
            _ => 500,
        }
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessingError::SourceNotFound { .. } => "source_not_found",
            ProcessingError::InvalidEvent(_) => "invalid_event",
            ProcessingError::Decode(_) => "decode",
            ProcessingError::WatermarkMissing { .. } => "watermark_missing",
            ProcessingError::Resize(_) => "resize",
            ProcessingError::Encode(_) => "encode",
            ProcessingError::Store(_) => "store",
            ProcessingError::Internal(_) => "internal",
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ProcessingError::Decode(message.into())
    }

    pub fn encode(message: impl Into<String>) -> Self {
        ProcessingError::Encode(message.into())
    }

    pub fn resize(message: impl Into<String>) -> Self {
        ProcessingError::Resize(message.into())
    }

    pub fn watermark_missing(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ProcessingError::WatermarkMissing {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

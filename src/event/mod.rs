//! S3 event notification parsing.
//!
//! Invocations are triggered by an object-created notification. Only the
//! fields needed to locate the uploaded object are modelled; everything else
//! in the envelope is ignored.
//!
//! ```json
//! {"Records": [{"s3": {"bucket": {"name": "uploads"}, "object": {"key": "cat+photo.png"}}}]}
//! ```

use crate::error::ProcessingError;
use serde::{Deserialize, Serialize};

/// Top-level notification envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Object {
    /// Object key as delivered by S3 (URL-encoded, spaces as `+`)
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// A single object in the store, addressed by bucket and decoded key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

impl S3Event {
    /// Parse a notification from its JSON text.
    pub fn from_json(payload: &str) -> Result<Self, ProcessingError> {
        serde_json::from_str(payload)
            .map_err(|e| ProcessingError::InvalidEvent(format!("malformed payload: {e}")))
    }

    /// Build an event referencing one object, as S3 would deliver it.
    pub fn for_object(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            records: vec![S3EventRecord {
                event_name: Some("ObjectCreated:Put".to_string()),
                s3: S3Entity {
                    bucket: S3Bucket { name: bucket.into() },
                    object: S3Object {
                        key: key.into(),
                        size: None,
                    },
                },
            }],
        }
    }

    /// Resolve the single object this event refers to.
    ///
    /// Exactly one record is accepted; batches are rejected.
    pub fn object_ref(&self) -> Result<ObjectRef, ProcessingError> {
        let record = match self.records.as_slice() {
            [record] => record,
            [] => {
                return Err(ProcessingError::InvalidEvent(
                    "event contains no records".to_string(),
                ))
            }
            records => {
                return Err(ProcessingError::InvalidEvent(format!(
                    "expected exactly one record, got {}",
                    records.len()
                )))
            }
        };

        let bucket = record.s3.bucket.name.trim();
        if bucket.is_empty() {
            return Err(ProcessingError::InvalidEvent(
                "bucket name is empty".to_string(),
            ));
        }

        let key = decode_object_key(&record.s3.object.key)?;
        if key.is_empty() {
            return Err(ProcessingError::InvalidEvent(
                "object key is empty".to_string(),
            ));
        }

        Ok(ObjectRef {
            bucket: bucket.to_string(),
            key,
        })
    }
}

/// Decode an object key the way S3 encodes it in notifications.
fn decode_object_key(raw: &str) -> Result<String, ProcessingError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ProcessingError::InvalidEvent(format!("object key is not valid UTF-8: {e}")))
}

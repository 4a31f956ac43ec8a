//! In-memory object store.
//!
//! Stands in for S3 in tests and local runs. Every call is recorded so
//! tests can assert which operations an invocation performed, and any
//! operation can be made to fail.

use super::{ObjectPresence, ObjectStore, StoreError, StoreOperation};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// An object held by the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: Option<String>,
}

/// One call made against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOperation {
    pub operation: StoreOperation,
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    objects: HashMap<(String, String), StoredObject>,
    operations: Vec<RecordedOperation>,
    failures: HashMap<StoreOperation, String>,
}

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    state: Mutex<MemoryState>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_object(self, bucket: &str, key: &str, data: impl Into<Bytes>) -> Self {
        self.insert(bucket, key, data, None);
        self
    }

    pub fn insert(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
    ) {
        self.state.lock().objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data: data.into(),
                content_type: content_type.map(str::to_string),
            },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.state
            .lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Sorted keys currently stored in `bucket`.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .state
            .lock()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn operations(&self) -> Vec<RecordedOperation> {
        self.state.lock().operations.clone()
    }

    pub fn count(&self, operation: StoreOperation) -> usize {
        self.state
            .lock()
            .operations
            .iter()
            .filter(|op| op.operation == operation)
            .count()
    }

    /// Make every subsequent call of `operation` fail with `message`.
    pub fn fail_on(&self, operation: StoreOperation, message: impl Into<String>) {
        self.state.lock().failures.insert(operation, message.into());
    }

    fn record(&self, operation: StoreOperation, bucket: &str, key: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.operations.push(RecordedOperation {
            operation,
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        match state.failures.get(&operation) {
            Some(message) => Err(StoreError::new(operation, bucket, key, message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn exists(&self, bucket: &str, key: &str) -> ObjectPresence {
        if let Err(e) = self.record(StoreOperation::Head, bucket, key) {
            return ObjectPresence::Error(e);
        }
        if self.object(bucket, key).is_some() {
            ObjectPresence::Found
        } else {
            ObjectPresence::NotFound
        }
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        self.record(StoreOperation::Get, bucket, key)?;
        self.object(bucket, key)
            .map(|o| o.data)
            .ok_or_else(|| StoreError::new(StoreOperation::Get, bucket, key, "NoSuchKey"))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.record(StoreOperation::Put, bucket, key)?;
        self.insert(bucket, key, body, Some(content_type));
        Ok(())
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StoreError> {
        self.record(StoreOperation::Presign, bucket, key)?;
        Ok(format!(
            "memory://{}/{}?expires={}",
            bucket,
            urlencoding::encode(key),
            ttl.as_secs()
        ))
    }
}

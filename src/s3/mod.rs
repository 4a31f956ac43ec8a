// S3 client module
//
// The object store is an injected collaborator: the handler only sees the
// `ObjectStore` trait, so an in-memory store can stand in for S3 in tests
// and local runs.

pub mod memory;

pub use memory::{MemoryObjectStore, RecordedOperation, StoredObject};

use crate::config::StorageConfig;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;

/// Store operations, used to label errors and recorded calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Head,
    Get,
    Put,
    Presign,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::Head => "HeadObject",
            StoreOperation::Get => "GetObject",
            StoreOperation::Put => "PutObject",
            StoreOperation::Presign => "PresignGetObject",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single store operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("S3 {operation} failed for {bucket}/{key}: {message}")]
pub struct StoreError {
    pub operation: StoreOperation,
    pub bucket: String,
    pub key: String,
    pub message: String,
}

impl StoreError {
    pub fn new(
        operation: StoreOperation,
        bucket: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            bucket: bucket.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result of an existence check
///
/// "Not found" is an ordinary answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectPresence {
    Found,
    NotFound,
    Error(StoreError),
}

/// Object store collaborator used by the processing handler
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether an object exists
    async fn exists(&self, bucket: &str, key: &str) -> ObjectPresence;

    /// Download an object's full body
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError>;

    /// Upload an object with the given content type
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// Issue a time-limited, credential-free GET link for an object
    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StoreError>;
}

/// Build an AWS SDK S3 client from storage configuration
///
/// Uses the default AWS provider chain unless static credentials are
/// configured. A custom endpoint (LocalStack, MinIO) is honoured when set.
pub async fn build_client(config: &StorageConfig) -> aws_sdk_s3::Client {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        loader = loader.credentials_provider(Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "inkstamp-config",
        ));
    }

    let shared = loader.load().await;
    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(config.force_path_style)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}

/// `ObjectStore` backed by the AWS SDK
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    pub async fn from_config(config: &StorageConfig) -> Self {
        Self::new(build_client(config).await)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn exists(&self, bucket: &str, key: &str) -> ObjectPresence {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => ObjectPresence::Found,
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false)
                    || err
                        .raw_response()
                        .map(|r| r.status().as_u16() == 404)
                        .unwrap_or(false);

                if not_found {
                    ObjectPresence::NotFound
                } else {
                    ObjectPresence::Error(StoreError::new(
                        StoreOperation::Head,
                        bucket,
                        key,
                        DisplayErrorContext(&err).to_string(),
                    ))
                }
            }
        }
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                StoreError::new(
                    StoreOperation::Get,
                    bucket,
                    key,
                    DisplayErrorContext(&e).to_string(),
                )
            })?;

        let body = response.body.collect().await.map_err(|e| {
            StoreError::new(
                StoreOperation::Get,
                bucket,
                key,
                format!("Failed to read body: {e}"),
            )
        })?;

        Ok(body.into_bytes())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                StoreError::new(
                    StoreOperation::Put,
                    bucket,
                    key,
                    DisplayErrorContext(&e).to_string(),
                )
            })?;

        Ok(())
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StoreError> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(|e| {
            StoreError::new(StoreOperation::Presign, bucket, key, e.to_string())
        })?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| {
                StoreError::new(
                    StoreOperation::Presign,
                    bucket,
                    key,
                    DisplayErrorContext(&e).to_string(),
                )
            })?;

        Ok(request.uri().to_string())
    }
}

//! Processing handler.
//!
//! Turns one trigger event into one outcome. The handler owns no state
//! between invocations: the store and the watermark source are injected at
//! construction, and every invocation works on its own copies of the images.
//!
//! Flow:
//!
//! 1. Resolve the single object the event references
//! 2. Check it exists (a missing object short-circuits with 404)
//! 3. Download it and load the watermark
//! 4. Run the image pipeline on a blocking thread
//! 5. Store the result under a fresh key and return a presigned link

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::Config;
use crate::error::ProcessingError;
use crate::event::{ObjectRef, S3Event};
use crate::image_optimizer::{ImagePipeline, PipelineSettings};
use crate::metrics::ProcessingMetrics;
use crate::s3::{ObjectPresence, ObjectStore};
use crate::watermark::{WatermarkAsset, WatermarkSource};

/// Result of one invocation, serialised as `{"statusCode": .., "body": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl Outcome {
    pub fn success(url: &str) -> Self {
        Self {
            status_code: 200,
            body: format!("Processed image available at {url}"),
        }
    }

    pub fn from_error(err: &ProcessingError) -> Self {
        let body = match err {
            ProcessingError::SourceNotFound { .. } => err.to_string(),
            _ => format!("Error: {err}"),
        };
        Self {
            status_code: err.status_code(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Where a processed image was stored.
#[derive(Debug, Clone)]
struct Published {
    key: String,
    url: String,
    bytes: usize,
}

pub struct Handler {
    store: Arc<dyn ObjectStore>,
    watermark: Arc<dyn WatermarkSource>,
    pipeline: Arc<ImagePipeline>,
    destination_bucket: String,
    key_prefix: String,
    presign_ttl: Duration,
}

impl Handler {
    pub fn new(
        config: &Config,
        store: Arc<dyn ObjectStore>,
        watermark: Arc<dyn WatermarkSource>,
    ) -> Self {
        Self {
            store,
            watermark,
            pipeline: Arc::new(ImagePipeline::new(PipelineSettings::from(&config.processing))),
            destination_bucket: config.storage.destination_bucket.clone(),
            key_prefix: config.storage.key_prefix.clone(),
            presign_ttl: Duration::from_secs(config.storage.presign_ttl_seconds),
        }
    }

    pub fn destination_bucket(&self) -> &str {
        &self.destination_bucket
    }

    /// Handle a raw JSON event payload.
    pub async fn handle_json(&self, payload: &str) -> Outcome {
        match S3Event::from_json(payload) {
            Ok(event) => self.handle(&event).await,
            Err(err) => self.finish(Err(err), Instant::now()),
        }
    }

    /// Handle one trigger event. Never panics on bad input; every failure
    /// becomes a 404 or 500 outcome.
    pub async fn handle(&self, event: &S3Event) -> Outcome {
        let started = Instant::now();
        let result = self.try_handle(event).await;
        self.finish(result, started)
    }

    fn finish(&self, result: Result<Published, ProcessingError>, started: Instant) -> Outcome {
        let outcome = match result {
            Ok(published) => {
                tracing::info!(
                    bucket = %self.destination_bucket,
                    key = %published.key,
                    output_bytes = published.bytes,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Processed image stored"
                );
                Outcome::success(&published.url)
            }
            Err(err @ ProcessingError::SourceNotFound { .. }) => {
                tracing::warn!(error = %err, "Source object missing");
                Outcome::from_error(&err)
            }
            Err(err) => {
                tracing::error!(error = %err, kind = err.kind(), "Processing failed");
                Outcome::from_error(&err)
            }
        };

        ProcessingMetrics::global().record_outcome(outcome.status_code);
        outcome
    }

    async fn try_handle(&self, event: &S3Event) -> Result<Published, ProcessingError> {
        let source = event.object_ref()?;
        tracing::debug!(source = %source, "Handling trigger event");

        self.ensure_exists(&source).await?;

        let data = self.store.get(&source.bucket, &source.key).await?;

        let watermark_bytes = self.watermark.load_watermark().await?;
        let asset = WatermarkAsset::decode(&watermark_bytes, &self.watermark.location())?;

        let pipeline = Arc::clone(&self.pipeline);
        let timer = ProcessingMetrics::global().pipeline_duration.start_timer();
        let processed = tokio::task::spawn_blocking(move || pipeline.process(&data, &asset))
            .await
            .map_err(|e| ProcessingError::Internal(format!("pipeline task failed: {e}")))??;
        timer.observe_duration();

        let size = processed.data.len();
        ProcessingMetrics::global().output_bytes.observe(size as f64);

        let key = format!("{}{}.{}", self.key_prefix, Uuid::new_v4(), processed.extension);
        self.store
            .put(
                &self.destination_bucket,
                &key,
                Bytes::from(processed.data),
                processed.content_type,
            )
            .await?;

        let url = self
            .store
            .presigned_url(&self.destination_bucket, &key, self.presign_ttl)
            .await?;

        Ok(Published {
            key,
            url,
            bytes: size,
        })
    }

    async fn ensure_exists(&self, source: &ObjectRef) -> Result<(), ProcessingError> {
        match self.store.exists(&source.bucket, &source.key).await {
            ObjectPresence::Found => Ok(()),
            ObjectPresence::NotFound => Err(ProcessingError::SourceNotFound {
                bucket: source.bucket.clone(),
                key: source.key.clone(),
            }),
            ObjectPresence::Error(e) => Err(e.into()),
        }
    }
}

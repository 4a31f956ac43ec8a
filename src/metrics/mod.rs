// Processing Prometheus metrics
//
// Provides:
// - Invocation counters by outcome (success, not_found, error)
// - Pipeline duration histogram
// - Encoded output size histogram

use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounter, TextEncoder,
};
use std::sync::OnceLock;

/// Global metrics for watermark processing invocations
pub struct ProcessingMetrics {
    /// Invocations that stored an image and returned a link
    pub success: IntCounter,

    /// Invocations whose source object did not exist
    pub not_found: IntCounter,

    /// Invocations that failed for any other reason
    pub errors: IntCounter,

    /// Duration of decode → composite → encode (in seconds)
    pub pipeline_duration: Histogram,

    /// Size of encoded output images (in bytes)
    pub output_bytes: Histogram,
}

static METRICS: OnceLock<ProcessingMetrics> = OnceLock::new();

impl ProcessingMetrics {
    /// Initialize and return the global metrics instance
    ///
    /// Subsequent calls return the same instance.
    pub fn global() -> &'static Self {
        METRICS.get_or_init(|| {
            let invocations = register_int_counter_vec!(
                "inkstamp_invocations_total",
                "Total number of processing invocations by outcome",
                &["outcome"] // success, not_found, error
            )
            .expect("Failed to register inkstamp_invocations_total metric");

            let pipeline_duration = register_histogram!(
                "inkstamp_pipeline_duration_seconds",
                "Duration of the image pipeline in seconds",
                vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
            )
            .expect("Failed to register inkstamp_pipeline_duration_seconds metric");

            let output_bytes = register_histogram!(
                "inkstamp_output_bytes",
                "Size of encoded output images in bytes",
                prometheus::exponential_buckets(1024.0, 4.0, 8)
                    .expect("valid exponential bucket parameters")
            )
            .expect("Failed to register inkstamp_output_bytes metric");

            ProcessingMetrics {
                success: invocations.with_label_values(&["success"]),
                not_found: invocations.with_label_values(&["not_found"]),
                errors: invocations.with_label_values(&["error"]),
                pipeline_duration,
                output_bytes,
            }
        })
    }

    /// Record the outcome of one invocation by its status code
    pub fn record_outcome(&self, status_code: u16) {
        match status_code {
            200 => self.success.inc(),
            404 => self.not_found.inc(),
            _ => self.errors.inc(),
        }
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound S3 accepts for a presigned URL lifetime (7 days)
pub const MAX_PRESIGN_TTL_SECONDS: u64 = 604_800;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Image pipeline parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Neither output dimension may exceed this bound (default: 600)
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// Watermark width as a fraction of the base width (default: 0.6)
    #[serde(default = "default_watermark_ratio")]
    pub watermark_ratio: f32,

    /// Watermark opacity, 0.0 transparent to 1.0 unchanged (default: 0.5)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Output JPEG quality (default: 75)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            watermark_ratio: default_watermark_ratio(),
            opacity: default_opacity(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_max_dimension() -> u32 {
    600
}

fn default_watermark_ratio() -> f32 {
    0.6
}

fn default_opacity() -> f32 {
    0.5
}

fn default_jpeg_quality() -> u8 {
    75
}

/// Location of the read-only watermark asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    #[serde(default = "default_watermark_path")]
    pub path: String,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            path: default_watermark_path(),
        }
    }
}

fn default_watermark_path() -> String {
    crate::watermark::DEFAULT_WATERMARK_PATH.to_string()
}

/// Destination store and presigned link settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_destination_bucket")]
    pub destination_bucket: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint (LocalStack, MinIO); AWS resolution when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Static credentials; the default AWS provider chain is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    #[serde(default)]
    pub force_path_style: bool,

    /// Prefix of generated destination keys (default: "processed-")
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Lifetime of the returned retrieval link (default: 3600)
    #[serde(default = "default_presign_ttl_seconds")]
    pub presign_ttl_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            destination_bucket: default_destination_bucket(),
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            force_path_style: false,
            key_prefix: default_key_prefix(),
            presign_ttl_seconds: default_presign_ttl_seconds(),
        }
    }
}

fn default_destination_bucket() -> String {
    "my-example-to-upload-modified-copy-images".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_key_prefix() -> String {
    "processed-".to_string()
}

fn default_presign_ttl_seconds() -> u64 {
    3600
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        let processing = &self.processing;

        if processing.max_dimension == 0 {
            return Err("processing.max_dimension must be > 0".to_string());
        }

        if !processing.watermark_ratio.is_finite()
            || !(0.0..=1.0).contains(&processing.watermark_ratio)
        {
            return Err(format!(
                "processing.watermark_ratio {} must be between 0.0 and 1.0",
                processing.watermark_ratio
            ));
        }

        if !processing.opacity.is_finite() || !(0.0..=1.0).contains(&processing.opacity) {
            return Err(format!(
                "processing.opacity {} must be between 0.0 and 1.0",
                processing.opacity
            ));
        }

        if !(1..=100).contains(&processing.jpeg_quality) {
            return Err(format!(
                "processing.jpeg_quality {} must be between 1 and 100",
                processing.jpeg_quality
            ));
        }

        if self.watermark.path.trim().is_empty() {
            return Err("watermark.path cannot be empty".to_string());
        }

        let storage = &self.storage;

        if storage.destination_bucket.trim().is_empty() {
            return Err("storage.destination_bucket cannot be empty".to_string());
        }

        if storage.region.trim().is_empty() {
            return Err("storage.region cannot be empty".to_string());
        }

        if storage.presign_ttl_seconds == 0 || storage.presign_ttl_seconds > MAX_PRESIGN_TTL_SECONDS
        {
            return Err(format!(
                "storage.presign_ttl_seconds {} must be between 1 and {}",
                storage.presign_ttl_seconds, MAX_PRESIGN_TTL_SECONDS
            ));
        }

        if storage.access_key.is_some() != storage.secret_key.is_some() {
            return Err(
                "storage.access_key and storage.secret_key must be set together".to_string(),
            );
        }

        if let Some(endpoint) = &storage.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!(
                    "storage.endpoint '{}' must start with http:// or https://",
                    endpoint
                ));
            }
        }

        Ok(())
    }
}

// Logging module for structured logging using the tracing crate

use crate::config::{LogFormat, LoggingConfig};
use std::error::Error;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - JSON or human-readable formatting, per `LoggingConfig::format`
/// - Filtering from `RUST_LOG` when set, otherwise `LoggingConfig::level`
/// - Output to stderr, leaving stdout for the invocation outcome
///
/// Calling this more than once is a no-op.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or another global
/// subscriber was installed outside this function.
///
/// # Examples
///
/// ```
/// use inkstamp::config::LoggingConfig;
/// use inkstamp::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(directive) if !directive.is_empty() => EnvFilter::try_new(directive)?,
        _ => EnvFilter::try_new(&config.level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Json => builder.json().with_current_span(false).try_init()?,
        LogFormat::Pretty => builder.pretty().try_init()?,
    }

    let _ = INITIALIZED.set(());
    Ok(())
}

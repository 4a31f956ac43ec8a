use anyhow::{Context, Result};
use clap::Parser;
use inkstamp::config::Config;
use inkstamp::handler::Handler;
use inkstamp::metrics::ProcessingMetrics;
use inkstamp::s3::S3ObjectStore;
use inkstamp::watermark::FileWatermarkSource;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

/// Inkstamp - watermark an uploaded image and publish a presigned link to it
#[derive(Parser, Debug)]
#[command(name = "inkstamp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the trigger event JSON, or "-" to read it from stdin
    #[arg(short, long)]
    event: String,

    /// Print Prometheus metrics to stderr after the invocation
    #[arg(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?,
        None => Config::default(),
    };
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    inkstamp::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    tracing::info!(
        config_file = ?args.config,
        destination_bucket = %config.storage.destination_bucket,
        watermark = %config.watermark.path,
        max_dimension = config.processing.max_dimension,
        "Configuration loaded successfully"
    );

    let payload = read_event(&args.event)?;

    let store = Arc::new(S3ObjectStore::from_config(&config.storage).await);
    let watermark = Arc::new(FileWatermarkSource::new(&config.watermark.path));
    let handler = Handler::new(&config, store, watermark);

    let outcome = handler.handle_json(&payload).await;
    println!(
        "{}",
        serde_json::to_string(&outcome).context("Failed to serialize outcome")?
    );

    if args.print_metrics {
        eprintln!("{}", ProcessingMetrics::global().render());
    }

    if !outcome.is_success() {
        std::process::exit(1);
    }

    Ok(())
}

fn read_event(source: &str) -> Result<String> {
    if source == "-" {
        let mut payload = String::new();
        std::io::stdin()
            .read_to_string(&mut payload)
            .context("Failed to read event from stdin")?;
        return Ok(payload);
    }

    let path = PathBuf::from(source);
    std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read event file {}", path.display()))
}

//! Watermark pipeline end-to-end against LocalStack
//!
//! Tests the complete flow:
//!   S3 event → HeadObject → GetObject → pipeline → PutObject → presigned GET
//!
//! These tests use testcontainers to run LocalStack in Docker.
//!
//! Run with:
//!   cargo test --test integration_tests localstack -- --ignored --nocapture

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use inkstamp::config::{Config, StorageConfig};
use inkstamp::event::S3Event;
use inkstamp::handler::Handler;
use inkstamp::s3::{build_client, ObjectPresence, ObjectStore, S3ObjectStore};
use inkstamp::watermark::FileWatermarkSource;
use std::io::{Cursor, Write};
use std::sync::Arc;
use testcontainers::{clients::Cli, RunnableImage};
use testcontainers_modules::localstack::LocalStack;

const SOURCE_BUCKET: &str = "uploads";
const DESTINATION_BUCKET: &str = "processed";

fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| Rgb([(x % 200) as u8, 40, 80]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .unwrap();
    buffer.into_inner()
}

fn write_watermark_file() -> tempfile::NamedTempFile {
    let img = RgbaImage::from_pixel(400, 100, Rgba([255, 255, 255, 255]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();

    let mut file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create watermark file");
    file.write_all(&buffer.into_inner())
        .expect("Failed to write watermark file");
    file
}

fn storage_config(endpoint: &str) -> StorageConfig {
    StorageConfig {
        destination_bucket: DESTINATION_BUCKET.to_string(),
        endpoint: Some(endpoint.to_string()),
        access_key: Some("test".to_string()),
        secret_key: Some("test".to_string()),
        force_path_style: true,
        ..StorageConfig::default()
    }
}

/// Start LocalStack, create both buckets and upload one source image
async fn setup_localstack<'a>(
    docker: &'a Cli,
) -> (testcontainers::Container<'a, LocalStack>, StorageConfig) {
    let localstack_image =
        RunnableImage::from(LocalStack::default()).with_env_var(("SERVICES", "s3"));

    let container = docker.run(localstack_image);
    let port = container.get_host_port_ipv4(4566);
    let storage = storage_config(&format!("http://127.0.0.1:{}", port));

    let client = build_client(&storage).await;
    for bucket in [SOURCE_BUCKET, DESTINATION_BUCKET] {
        client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .expect("Failed to create bucket");
    }

    client
        .put_object()
        .bucket(SOURCE_BUCKET)
        .key("holiday photo.jpg")
        .body(create_test_jpeg(1200, 800).into())
        .content_type("image/jpeg")
        .send()
        .await
        .expect("Failed to upload source image");

    (container, storage)
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_localstack_watermark_round_trip() {
    let docker = Cli::default();
    let (_container, storage) = setup_localstack(&docker).await;
    let watermark = write_watermark_file();

    let config = Config {
        storage: storage.clone(),
        ..Config::default()
    };
    let store = Arc::new(S3ObjectStore::from_config(&storage).await);
    let handler = Handler::new(
        &config,
        store.clone(),
        Arc::new(FileWatermarkSource::new(watermark.path())),
    );

    let outcome = handler
        .handle(&S3Event::for_object(SOURCE_BUCKET, "holiday+photo.jpg"))
        .await;
    assert_eq!(outcome.status_code, 200, "{}", outcome.body);

    let url = outcome
        .body
        .strip_prefix("Processed image available at ")
        .expect("success body carries the link");
    assert!(url.contains("X-Amz-Expires=3600"), "{}", url);

    let key = url
        .split('?')
        .next()
        .and_then(|path| path.rsplit('/').next())
        .expect("link names the stored key");
    assert!(key.starts_with("processed-") && key.ends_with(".jpg"));

    let client = build_client(&storage).await;
    let stored = client
        .get_object()
        .bucket(DESTINATION_BUCKET)
        .key(key)
        .send()
        .await
        .expect("processed object exists");
    assert_eq!(stored.content_type(), Some("image/jpeg"));

    let body = stored.body.collect().await.unwrap().into_bytes();
    let output = image::load_from_memory(&body).unwrap();
    assert_eq!(output.dimensions(), (600, 400));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_localstack_missing_object_is_404() {
    let docker = Cli::default();
    let (_container, storage) = setup_localstack(&docker).await;

    let store = Arc::new(S3ObjectStore::from_config(&storage).await);
    assert_eq!(
        store.exists(SOURCE_BUCKET, "nope.jpg").await,
        ObjectPresence::NotFound
    );

    let config = Config {
        storage: storage.clone(),
        ..Config::default()
    };
    let handler = Handler::new(
        &config,
        store,
        Arc::new(FileWatermarkSource::new("/nonexistent/watermark.png")),
    );

    let outcome = handler
        .handle(&S3Event::for_object(SOURCE_BUCKET, "nope.jpg"))
        .await;
    assert_eq!(outcome.status_code, 404);
    assert_eq!(outcome.body, "Object nope.jpg not found in uploads");
}

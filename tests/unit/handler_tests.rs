// Processing handler tests
// Drive whole invocations against in-memory and mocked collaborators

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use inkstamp::config::Config;
use inkstamp::event::S3Event;
use inkstamp::handler::{Handler, Outcome};
use inkstamp::s3::{MemoryObjectStore, ObjectPresence, ObjectStore, StoreError, StoreOperation};
use inkstamp::watermark::{FileWatermarkSource, StaticWatermarkSource};
use mockall::mock;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Store {}

    #[async_trait]
    impl ObjectStore for Store {
        async fn exists(&self, bucket: &str, key: &str) -> ObjectPresence;
        async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError>;
        async fn put(
            &self,
            bucket: &str,
            key: &str,
            body: Bytes,
            content_type: &str,
        ) -> Result<(), StoreError>;
        async fn presigned_url(
            &self,
            bucket: &str,
            key: &str,
            ttl: Duration,
        ) -> Result<String, StoreError>;
    }
}

fn black_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .unwrap();
    buffer.into_inner()
}

fn white_watermark_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

fn mean_luma(img: &DynamicImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> f64 {
    let mut total = 0u64;
    let mut count = 0u64;
    for y in ys {
        for x in xs.clone() {
            total += img.get_pixel(x, y)[0] as u64;
            count += 1;
        }
    }
    total as f64 / count as f64
}

#[tokio::test]
async fn test_end_to_end_scales_and_stamps() {
    let store = Arc::new(
        MemoryObjectStore::new().with_object("uploads", "big photo.jpg", black_jpeg(1200, 800)),
    );
    let watermark = Arc::new(StaticWatermarkSource::new(
        "watermark.png",
        white_watermark_png(400, 100),
    ));
    let config = Config::default();
    let handler = Handler::new(&config, store.clone(), watermark.clone());

    let outcome = handler
        .handle(&S3Event::for_object("uploads", "big+photo.jpg"))
        .await;

    assert_eq!(outcome.status_code, 200, "{}", outcome.body);
    assert!(outcome
        .body
        .starts_with("Processed image available at memory://"));
    assert_eq!(watermark.load_count(), 1);

    let keys = store.keys(&config.storage.destination_bucket);
    assert_eq!(keys.len(), 1);
    let stored = store
        .object(&config.storage.destination_bucket, &keys[0])
        .unwrap();
    assert_eq!(stored.content_type.as_deref(), Some("image/jpeg"));

    let output = image::load_from_memory(&stored.data).unwrap();
    assert_eq!(output.dimensions(), (600, 400));

    // Watermark is 360x90 at (240, 155): half-opacity white over black
    let stamped = mean_luma(&output, 250..590, 165..235);
    let untouched = mean_luma(&output, 0..200, 0..400);
    assert!(stamped > 20.0, "stamped region mean {}", stamped);
    assert!(untouched < 8.0, "untouched region mean {}", untouched);
}

#[tokio::test]
async fn test_missing_source_short_circuits_with_404() {
    let mut store = MockStore::new();
    store
        .expect_exists()
        .times(1)
        .returning(|bucket, key| {
            assert_eq!(bucket, "uploads");
            assert_eq!(key, "cat.png");
            ObjectPresence::NotFound
        });
    store.expect_get().never();
    store.expect_put().never();
    store.expect_presigned_url().never();

    let watermark = Arc::new(StaticWatermarkSource::new(
        "watermark.png",
        white_watermark_png(4, 4),
    ));
    let handler = Handler::new(&Config::default(), Arc::new(store), watermark.clone());

    let outcome = handler
        .handle(&S3Event::for_object("uploads", "cat.png"))
        .await;

    assert_eq!(
        outcome,
        Outcome {
            status_code: 404,
            body: "Object cat.png not found in uploads".to_string(),
        }
    );
    assert_eq!(watermark.load_count(), 0);
}

#[tokio::test]
async fn test_existence_check_error_is_500() {
    let mut store = MockStore::new();
    store.expect_exists().returning(|bucket, key| {
        ObjectPresence::Error(StoreError::new(
            StoreOperation::Head,
            bucket,
            key,
            "AccessDenied",
        ))
    });
    store.expect_get().never();

    let handler = Handler::new(
        &Config::default(),
        Arc::new(store),
        Arc::new(StaticWatermarkSource::new("w.png", white_watermark_png(4, 4))),
    );

    let outcome = handler.handle(&S3Event::for_object("uploads", "a.jpg")).await;
    assert_eq!(outcome.status_code, 500);
    assert!(outcome.body.starts_with("Error: S3 HeadObject failed"));
    assert!(outcome.body.contains("AccessDenied"));
}

#[tokio::test]
async fn test_missing_watermark_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("watermark.png");

    let store = Arc::new(MemoryObjectStore::new().with_object("uploads", "a.jpg", black_jpeg(32, 32)));
    let handler = Handler::new(
        &Config::default(),
        store.clone(),
        Arc::new(FileWatermarkSource::new(&missing)),
    );

    let outcome = handler.handle(&S3Event::for_object("uploads", "a.jpg")).await;

    assert_eq!(outcome.status_code, 500);
    assert!(
        outcome.body.starts_with(&format!(
            "Error: Watermark not found at {}",
            missing.display()
        )),
        "{}",
        outcome.body
    );
    assert_eq!(store.count(StoreOperation::Put), 0);
}

#[tokio::test]
async fn test_corrupt_source_is_500() {
    let store = Arc::new(MemoryObjectStore::new().with_object(
        "uploads",
        "broken.jpg",
        Bytes::from_static(b"\xff\xd8\xff garbage"),
    ));
    let handler = Handler::new(
        &Config::default(),
        store.clone(),
        Arc::new(StaticWatermarkSource::new("w.png", white_watermark_png(4, 4))),
    );

    let outcome = handler
        .handle(&S3Event::for_object("uploads", "broken.jpg"))
        .await;

    assert_eq!(outcome.status_code, 500);
    assert!(outcome.body.starts_with("Error: Failed to decode image"));
    assert!(store.keys("my-example-to-upload-modified-copy-images").is_empty());
}

#[tokio::test]
async fn test_presign_failure_is_500() {
    let store = Arc::new(MemoryObjectStore::new().with_object("uploads", "a.jpg", black_jpeg(16, 16)));
    store.fail_on(StoreOperation::Presign, "clock skew");

    let handler = Handler::new(
        &Config::default(),
        store.clone(),
        Arc::new(StaticWatermarkSource::new("w.png", white_watermark_png(4, 4))),
    );
    let outcome = handler.handle(&S3Event::for_object("uploads", "a.jpg")).await;

    assert_eq!(outcome.status_code, 500);
    assert!(outcome.body.contains("clock skew"));
}

#[tokio::test]
async fn test_uses_configured_destination_and_ttl() {
    let mut config = Config::default();
    config.storage.destination_bucket = "thumbs".to_string();
    config.storage.key_prefix = "wm/".to_string();
    config.storage.presign_ttl_seconds = 120;

    let mut store = MockStore::new();
    store.expect_exists().returning(|_, _| ObjectPresence::Found);
    store
        .expect_get()
        .returning(|_, _| Ok(Bytes::from(black_jpeg(10, 10))));
    store
        .expect_put()
        .times(1)
        .returning(|bucket, key, body, content_type| {
            assert_eq!(bucket, "thumbs");
            assert!(key.starts_with("wm/") && key.ends_with(".jpg"));
            assert!(!body.is_empty());
            assert_eq!(content_type, "image/jpeg");
            Ok(())
        });
    store
        .expect_presigned_url()
        .times(1)
        .returning(|bucket, key, ttl| {
            assert_eq!(ttl, Duration::from_secs(120));
            Ok(format!("https://{bucket}.example/{key}"))
        });

    let handler = Handler::new(
        &config,
        Arc::new(store),
        Arc::new(StaticWatermarkSource::new("w.png", white_watermark_png(4, 4))),
    );
    let outcome = handler.handle(&S3Event::for_object("uploads", "a.jpg")).await;

    assert_eq!(outcome.status_code, 200, "{}", outcome.body);
    assert!(outcome
        .body
        .starts_with("Processed image available at https://thumbs.example/wm/"));
}

#[tokio::test]
async fn test_each_invocation_gets_a_fresh_key() {
    let store = Arc::new(MemoryObjectStore::new().with_object("uploads", "a.jpg", black_jpeg(8, 8)));
    let handler = Handler::new(
        &Config::default(),
        store.clone(),
        Arc::new(StaticWatermarkSource::new("w.png", white_watermark_png(4, 4))),
    );

    let event = S3Event::for_object("uploads", "a.jpg");
    let first = handler.handle(&event).await;
    let second = handler.handle(&event).await;

    assert_eq!(first.status_code, 200);
    assert_eq!(second.status_code, 200);
    assert_ne!(first.body, second.body);
    assert_eq!(
        store
            .keys("my-example-to-upload-modified-copy-images")
            .len(),
        2
    );
}

#[tokio::test]
async fn test_batched_event_is_rejected() {
    let store = Arc::new(MemoryObjectStore::new());
    let handler = Handler::new(
        &Config::default(),
        store.clone(),
        Arc::new(StaticWatermarkSource::new("w.png", white_watermark_png(4, 4))),
    );

    let payload = r#"{"Records": [
        {"s3": {"bucket": {"name": "uploads"}, "object": {"key": "a.jpg"}}},
        {"s3": {"bucket": {"name": "uploads"}, "object": {"key": "b.jpg"}}}
    ]}"#;
    let outcome = handler.handle_json(payload).await;

    assert_eq!(outcome.status_code, 500);
    assert!(outcome.body.contains("exactly one record"));
    assert!(store.operations().is_empty());
}

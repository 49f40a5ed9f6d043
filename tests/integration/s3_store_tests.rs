//! S3 store integration tests against a local MinIO.
//!
//! # Requirements
//!
//! A MinIO server on `localhost:9000` with the default credentials:
//! ```bash
//! docker run -p 9000:9000 minio/minio server /data
//! ```
//!
//! # Running the tests
//!
//! ```bash
//! cargo test --test integration s3_store -- --ignored
//! ```
//!
//! These tests are marked as `#[ignore]` by default because they require an
//! external service. They also skip themselves when MinIO is unreachable.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use steg_ws::error::ErrorCode;
use steg_ws::store::{ImageStore, S3ImageStore};

use super::test_utils::create_ppm;

const MINIO_ENDPOINT: &str = "http://localhost:9000";
const MINIO_BUCKET: &str = "steg-ws-test";

/// MinIO credentials (server defaults)
const MINIO_ACCESS_KEY: &str = "minioadmin";
const MINIO_SECRET_KEY: &str = "minioadmin";

/// Check if the MinIO service is reachable
async fn is_minio_available() -> bool {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
    {
        Ok(c) => c,
        Err(_) => return false,
    };

    client
        .get(format!("{}/minio/health/live", MINIO_ENDPOINT))
        .send()
        .await
        .map(|r| r.status().is_success())
        .unwrap_or(false)
}

/// Create an S3 client configured for MinIO
fn create_minio_client() -> aws_sdk_s3::Client {
    let creds = aws_sdk_s3::config::Credentials::new(
        MINIO_ACCESS_KEY,
        MINIO_SECRET_KEY,
        None,
        None,
        "test",
    );

    let config = aws_sdk_s3::Config::builder()
        .behavior_version_latest()
        .region(aws_sdk_s3::config::Region::new("us-east-1"))
        .endpoint_url(MINIO_ENDPOINT)
        .credentials_provider(creds)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// A store over the test bucket, isolated under a fresh key prefix.
async fn minio_store() -> Option<S3ImageStore> {
    if !is_minio_available().await {
        eprintln!("MinIO not available at {}, skipping", MINIO_ENDPOINT);
        return None;
    }

    let client = create_minio_client();
    // Already existing is fine
    let _ = client.create_bucket().bucket(MINIO_BUCKET).send().await;

    let run = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let prefix = format!("run-{}", run);
    Some(S3ImageStore::new(client, MINIO_BUCKET, Some(&prefix)))
}

#[tokio::test]
#[ignore]
async fn test_s3_put_get_meta_list() {
    let Some(store) = minio_store().await else {
        return;
    };
    let ppm = create_ppm(10, 10);

    let first = store
        .put_bytes("g1", Bytes::from(ppm.clone()), "ppm")
        .await
        .unwrap();
    let second = store
        .put_bytes("g1", Bytes::from(ppm.clone()), "ppm")
        .await
        .unwrap();
    assert_ne!(first, second);

    let bytes = store.get("g1", &first, "ppm").await.unwrap();
    assert_eq!(bytes.as_ref(), ppm.as_slice());

    let png = store.get("g1", &first, "png").await.unwrap();
    assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));

    let meta = store.meta("g1", &first).await.unwrap();
    assert_eq!(meta["group"], "g1");
    assert_eq!(meta["name"], first.as_str());
    assert_eq!(meta["type"], "ppm");
    assert_eq!(meta["width"], 10);
    assert_eq!(meta["height"], 10);

    let mut expected = vec![first, second];
    expected.sort();
    assert_eq!(store.list("g1").await.unwrap(), expected);
    assert!(store.list("empty").await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_s3_missing_image_is_not_found() {
    let Some(store) = minio_store().await else {
        return;
    };

    let err = store
        .get("g1", "0123456789abcdef", "ppm")
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotFound));

    let err = store.meta("g1", "0123456789abcdef").await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotFound));
}

#[tokio::test]
#[ignore]
async fn test_s3_rejects_empty_type() {
    let Some(store) = minio_store().await else {
        return;
    };

    let err = store
        .put_bytes("g1", Bytes::from_static(b"data"), "")
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::BadFormat));
}

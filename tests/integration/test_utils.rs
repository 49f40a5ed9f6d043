//! Test utilities for integration tests.
//!
//! This module provides a scripted mock store, request builders and helpers
//! for creating test pixmaps.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use steg_ws::error::{DomainError, ErrorCode, ServiceError};
use steg_ws::steg::LsbCodec;
use steg_ws::store::ImageStore;
use steg_ws::{create_router, RouterConfig};

/// Port the test routers advertise in `Location` headers.
pub const TEST_PORT: u16 = 3000;

const BOUNDARY: &str = "steg-ws-test-boundary";

// =============================================================================
// Router Helpers
// =============================================================================

/// Router configuration used by most tests.
pub fn test_config() -> RouterConfig {
    RouterConfig::new(TEST_PORT).with_tracing(false)
}

/// Build a router over `store` with the LSB codec.
pub fn test_router<S: ImageStore + 'static>(store: S) -> Router {
    create_router(store, LsbCodec::new(), test_config())
}

/// Build a router over `store` mounted under `base`.
pub fn test_router_with_base<S: ImageStore + 'static>(store: S, base: &str) -> Router {
    create_router(store, LsbCodec::new(), test_config().with_base(base))
}

// =============================================================================
// Request Builders
// =============================================================================

/// Encode a single-file multipart form body.
///
/// Returns the `Content-Type` header value and the body.
pub fn multipart_body(field: &str, filename: &str, data: &[u8]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

/// `POST {uri}` uploading `data` as the `img` field named `filename`.
pub fn upload_request(uri: &str, filename: &str, data: &[u8]) -> Request<Body> {
    upload_field_request(uri, "img", filename, data)
}

/// `POST {uri}` uploading `data` under an arbitrary form field.
pub fn upload_field_request(uri: &str, field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    let (content_type, body) = multipart_body(field, filename, data);
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, "localhost")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

/// `POST {uri}` with a JSON body.
pub fn json_request(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, "localhost")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

/// `GET {uri}`.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "localhost")
        .body(Body::empty())
        .unwrap()
}

// =============================================================================
// Response Helpers
// =============================================================================

/// The `Location` header of a response.
pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("response should carry a Location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// The path part of a `Location` produced by a test router.
pub fn location_path(location: &str) -> String {
    let origin = format!("http://localhost:{}", TEST_PORT);
    location
        .strip_prefix(&origin)
        .unwrap_or_else(|| panic!("unexpected location origin: {}", location))
        .to_string()
}

/// Collect a response body.
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Collect and parse a JSON response body.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = body_bytes(response).await;
    serde_json::from_slice(&body).expect("response body should be JSON")
}

// =============================================================================
// Test Image Creation
// =============================================================================

/// Create a binary P6 pixmap with a deterministic gradient.
pub fn create_ppm(width: u32, height: u32) -> Vec<u8> {
    let mut data = format!("P6\n{} {}\n255\n", width, height).into_bytes();
    let len = (width * height * 3) as usize;
    data.extend((0..len).map(|i| (i * 7 % 256) as u8));
    data
}

/// Length of the header written by [`create_ppm`].
pub fn ppm_header_len(width: u32, height: u32) -> usize {
    format!("P6\n{} {}\n255\n", width, height).len()
}

// =============================================================================
// Scripted Mock Store
// =============================================================================

/// Which store operation a [`FailingStore`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Put,
    Get,
    Meta,
    List,
}

/// The error a [`FailingStore`] returns.
#[derive(Debug, Clone)]
pub enum Failure {
    Domain(ErrorCode, &'static str),
    Internal(&'static str),
}

impl Failure {
    fn to_error(&self) -> ServiceError {
        match self {
            Failure::Domain(code, message) => DomainError::new(*code, *message).into(),
            Failure::Internal(message) => ServiceError::internal(message),
        }
    }
}

/// A store that fails one operation with a scripted error.
///
/// Every other operation succeeds with canned data. All calls are counted.
#[derive(Clone)]
pub struct FailingStore {
    op: Op,
    failure: Failure,
    calls: Arc<AtomicUsize>,
}

impl FailingStore {
    pub fn new(op: Op, failure: Failure) -> Self {
        Self {
            op,
            failure,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, op: Op) -> Result<(), ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if op == self.op {
            Err(self.failure.to_error())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ImageStore for FailingStore {
    async fn put_bytes(
        &self,
        _group: &str,
        _bytes: Bytes,
        _image_type: &str,
    ) -> Result<String, ServiceError> {
        self.check(Op::Put)?;
        Ok("0000000000000000".to_string())
    }

    async fn get(
        &self,
        _group: &str,
        _name: &str,
        _image_type: &str,
    ) -> Result<Bytes, ServiceError> {
        self.check(Op::Get)?;
        Ok(Bytes::from(create_ppm(10, 10)))
    }

    async fn meta(&self, group: &str, name: &str) -> Result<serde_json::Value, ServiceError> {
        self.check(Op::Meta)?;
        Ok(serde_json::json!({ "group": group, "name": name }))
    }

    async fn list(&self, _group: &str) -> Result<Vec<String>, ServiceError> {
        self.check(Op::List)?;
        Ok(Vec::new())
    }
}

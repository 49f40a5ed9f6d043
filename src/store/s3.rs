//! S3-backed image store.
//!
//! # Object Layout
//!
//! ```text
//! {prefix}{group}/{name}.{type}        image bytes
//! {prefix}{group}/{name}.meta.json     ImageMeta as JSON
//! ```
//!
//! The metadata object is written first with `If-None-Match: *`. Whoever
//! creates it owns the name, so two concurrent uploads can never be handed
//! the same name.

use std::fmt;

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{DomainError, ErrorCode, ServiceError};

use super::names::NameGenerator;
use super::{represent, validate_type, ImageMeta, ImageStore};

/// Suffix of metadata objects.
const META_SUFFIX: &str = ".meta.json";

/// Attempts at claiming a fresh name before giving up with `EXISTS`.
const MAX_NAME_ATTEMPTS: usize = 4;

/// Page size for listing a group.
const LIST_PAGE_SIZE: i32 = 1000;

/// Store keeping images as objects in an S3 bucket.
pub struct S3ImageStore {
    client: Client,
    bucket: String,
    prefix: String,
    names: NameGenerator,
}

impl S3ImageStore {
    /// Create a store over `bucket`, with every key starting with `prefix`.
    ///
    /// A non-empty prefix is normalised to end with `/`.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: Option<&str>) -> Self {
        let prefix = match prefix.map(|p| p.trim_matches('/')) {
            Some(p) if !p.is_empty() => format!("{}/", p),
            _ => String::new(),
        };
        Self {
            client,
            bucket: bucket.into(),
            prefix,
            names: NameGenerator::new(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn group_prefix(&self, group: &str) -> String {
        format!("{}{}/", self.prefix, group)
    }

    fn image_key(&self, group: &str, name: &str, image_type: &str) -> String {
        format!("{}{}.{}", self.group_prefix(group), name, image_type)
    }

    fn meta_key(&self, group: &str, name: &str) -> String {
        format!("{}{}{}", self.group_prefix(group), name, META_SUFFIX)
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    /// Read a whole object, mapping a missing key to `NOT_FOUND`.
    async fn read_object(&self, key: &str) -> Result<Bytes, DomainError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let no_such_key = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                read_failure(&self.location(key), no_such_key, status_of(&e), &e)
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| DomainError::read(format!("reading {}: {}", self.location(key), e)))?
            .into_bytes();

        Ok(data)
    }

    async fn load_meta(&self, group: &str, name: &str) -> Result<ImageMeta, DomainError> {
        let key = self.meta_key(group, name);
        let raw = self.read_object(&key).await.map_err(|e| match e.code {
            ErrorCode::NotFound => {
                DomainError::not_found(format!("image {}/{} not found", group, name))
            }
            _ => e,
        })?;

        serde_json::from_slice(&raw).map_err(|e| {
            DomainError::read(format!("corrupt metadata at {}: {}", self.location(&key), e))
        })
    }

    /// Create the metadata object for `meta`, failing if the key exists.
    ///
    /// Returns `Ok(false)` when another writer already owns the name.
    async fn claim_name(&self, meta: &ImageMeta) -> Result<bool, DomainError> {
        let key = self.meta_key(&meta.group, &meta.name);
        let body = serde_json::to_vec(meta)
            .map_err(|e| DomainError::write(format!("encoding metadata: {}", e)))?;

        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/json")
            .if_none_match("*")
            .body(ByteStream::from(body))
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_name_taken(status_of(&e)) => Ok(false),
            Err(e) => Err(DomainError::write(format!(
                "writing {}: {}",
                self.location(&key),
                e
            ))),
        }
    }
}

/// HTTP status of the raw response behind an SDK error, if one was received.
fn status_of<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|r| r.status().as_u16())
}

/// Whether a failed conditional put means another writer owns the key.
///
/// S3 answers 412 Precondition Failed; some implementations answer 409 when
/// two conditional writes race.
fn is_name_taken(status: Option<u16>) -> bool {
    matches!(status, Some(409) | Some(412))
}

/// Map a failed object read at `location` to a domain error.
fn read_failure(
    location: &str,
    no_such_key: bool,
    status: Option<u16>,
    detail: &dyn fmt::Display,
) -> DomainError {
    if no_such_key || status == Some(404) {
        DomainError::not_found(format!("{} not found", location))
    } else {
        DomainError::read(format!("reading {}: {}", location, detail))
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn put_bytes(
        &self,
        group: &str,
        bytes: Bytes,
        image_type: &str,
    ) -> Result<String, ServiceError> {
        validate_type(image_type)?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = self.names.next_name(group);
            let meta = ImageMeta::describe(group, &name, image_type, &bytes);

            if !self.claim_name(&meta).await? {
                warn!(group, name = %name, "Name collision in S3 store, retrying");
                continue;
            }

            let key = self.image_key(group, &name, image_type);
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&key)
                .body(ByteStream::from(bytes.clone()))
                .send()
                .await
                .map_err(|e| {
                    DomainError::write(format!("writing {}: {}", self.location(&key), e))
                })?;

            debug!(key = %key, size = bytes.len(), "Stored image in S3");
            return Ok(name);
        }

        Err(DomainError::exists(format!("could not assign a fresh name in group {}", group)).into())
    }

    async fn get(&self, group: &str, name: &str, image_type: &str) -> Result<Bytes, ServiceError> {
        let meta = self.load_meta(group, name).await?;
        let stored = self
            .read_object(&self.image_key(group, name, &meta.image_type))
            .await?;
        Ok(represent(&meta, stored, image_type)?)
    }

    async fn meta(&self, group: &str, name: &str) -> Result<serde_json::Value, ServiceError> {
        let meta = self.load_meta(group, name).await?;
        serde_json::to_value(meta).map_err(ServiceError::internal)
    }

    async fn list(&self, group: &str) -> Result<Vec<String>, ServiceError> {
        let prefix = self.group_prefix(group);
        let mut names = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .max_keys(LIST_PAGE_SIZE);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let result = request.send().await.map_err(|e| {
                DomainError::read(format!("listing {}: {}", self.location(&prefix), e))
            })?;

            names.extend(
                result
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key())
                    .filter_map(|key| name_from_meta_key(&prefix, key)),
            );

            if result.is_truncated() == Some(true) {
                continuation_token = result.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        names.sort();
        Ok(names)
    }
}

/// Extract the image name from a metadata key directly under `prefix`.
fn name_from_meta_key(prefix: &str, key: &str) -> Option<String> {
    let name = key.strip_prefix(prefix)?.strip_suffix(META_SUFFIX)?;
    if name.is_empty() || name.contains('/') {
        return None;
    }
    Some(name.to_string())
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services generally need path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}

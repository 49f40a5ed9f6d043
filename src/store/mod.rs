//! Image store abstraction and backends.
//!
//! The HTTP layer talks to storage only through the [`ImageStore`] trait.
//! Two backends are provided:
//!
//! - [`MemoryImageStore`] - process-local, used for development and tests
//! - [`S3ImageStore`] - objects in an S3 or S3-compatible bucket
//!
//! # Naming
//!
//! Stores assign image names; clients never choose them. Names are 16
//! lowercase hex characters and never contain `.` or `/`, so they are always
//! a single path segment.

mod convert;
mod memory;
mod names;
mod s3;

pub use convert::{image_dimensions, transcode};
pub use memory::MemoryImageStore;
pub use names::{NameGenerator, NAME_LEN};
pub use s3::{create_s3_client, S3ImageStore};

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, ErrorCode, ServiceError};

/// Keyed storage for image bytes, grouped by namespace.
///
/// Implementations must assign names atomically: concurrent `put_bytes`
/// calls on the same group never receive the same name.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` as a new image of `image_type` in `group`.
    ///
    /// Returns the assigned name.
    async fn put_bytes(
        &self,
        group: &str,
        bytes: Bytes,
        image_type: &str,
    ) -> Result<String, ServiceError>;

    /// Fetch the bytes of `group/name` in representation `image_type`.
    async fn get(&self, group: &str, name: &str, image_type: &str) -> Result<Bytes, ServiceError>;

    /// Fetch the metadata object of `group/name`.
    async fn meta(&self, group: &str, name: &str) -> Result<serde_json::Value, ServiceError>;

    /// Names of all images in `group`. An unknown group is empty.
    async fn list(&self, group: &str) -> Result<Vec<String>, ServiceError>;
}

#[async_trait]
impl<T: ImageStore + ?Sized> ImageStore for Arc<T> {
    async fn put_bytes(
        &self,
        group: &str,
        bytes: Bytes,
        image_type: &str,
    ) -> Result<String, ServiceError> {
        (**self).put_bytes(group, bytes, image_type).await
    }

    async fn get(&self, group: &str, name: &str, image_type: &str) -> Result<Bytes, ServiceError> {
        (**self).get(group, name, image_type).await
    }

    async fn meta(&self, group: &str, name: &str) -> Result<serde_json::Value, ServiceError> {
        (**self).meta(group, name).await
    }

    async fn list(&self, group: &str) -> Result<Vec<String>, ServiceError> {
        (**self).list(group).await
    }
}

/// Metadata recorded for every stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMeta {
    pub group: String,
    pub name: String,

    /// Type token the image was stored as
    #[serde(rename = "type")]
    pub image_type: String,

    /// Pixel width, when the type is decodable
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub width: Option<u32>,

    /// Pixel height, when the type is decodable
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub height: Option<u32>,

    /// Size of the stored bytes
    pub size: u64,

    /// Creation time in milliseconds since the Unix epoch
    pub created_at: u64,
}

impl ImageMeta {
    /// Describe `bytes` about to be stored as `group/name.image_type`.
    pub fn describe(group: &str, name: &str, image_type: &str, bytes: &[u8]) -> Self {
        let dimensions = image_dimensions(bytes, image_type);
        Self {
            group: group.to_string(),
            name: name.to_string(),
            image_type: image_type.to_string(),
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            size: bytes.len() as u64,
            created_at: now_millis(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Reject type tokens that cannot address an image.
pub(crate) fn validate_type(image_type: &str) -> Result<(), DomainError> {
    if image_type.is_empty() {
        return Err(DomainError::new(
            ErrorCode::BadFormat,
            "image type is required (upload a file with an extension)",
        ));
    }
    if image_type.contains(['.', '/']) {
        return Err(DomainError::new(
            ErrorCode::BadFormat,
            format!("invalid image type: {}", image_type),
        ));
    }
    Ok(())
}

/// Produce `image_type` bytes from an image stored as `meta.image_type`.
///
/// A request for the stored type returns the stored bytes untouched.
pub(crate) fn represent(
    meta: &ImageMeta,
    stored: Bytes,
    image_type: &str,
) -> Result<Bytes, DomainError> {
    if meta.image_type == image_type {
        return Ok(stored);
    }
    match transcode(&stored, &meta.image_type, image_type)? {
        Some(converted) => Ok(Bytes::from(converted)),
        None => Err(DomainError::not_found(format!(
            "image {}/{} is not available as {}",
            meta.group, meta.name, image_type
        ))),
    }
}

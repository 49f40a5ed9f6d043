//! In-memory image store.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{DomainError, ServiceError};

use super::names::NameGenerator;
use super::{represent, validate_type, ImageMeta, ImageStore};

/// Attempts at drawing a fresh name before giving up with `EXISTS`.
const MAX_NAME_ATTEMPTS: usize = 8;

struct StoredImage {
    bytes: Bytes,
    meta: ImageMeta,
}

/// Process-local store backed by a map of groups.
///
/// Name assignment and insertion happen under one write lock, which makes
/// them atomic with respect to concurrent uploads.
#[derive(Default)]
pub struct MemoryImageStore {
    groups: RwLock<HashMap<String, HashMap<String, StoredImage>>>,
    names: NameGenerator,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of images across all groups.
    pub async fn len(&self) -> usize {
        self.groups.read().await.values().map(HashMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put_bytes(
        &self,
        group: &str,
        bytes: Bytes,
        image_type: &str,
    ) -> Result<String, ServiceError> {
        validate_type(image_type)?;

        let mut groups = self.groups.write().await;
        let images = groups.entry(group.to_string()).or_default();

        let name = (0..MAX_NAME_ATTEMPTS)
            .map(|_| self.names.next_name(group))
            .find(|name| !images.contains_key(name))
            .ok_or_else(|| {
                DomainError::exists(format!("could not assign a fresh name in group {}", group))
            })?;

        let meta = ImageMeta::describe(group, &name, image_type, &bytes);
        debug!(group, name = %name, image_type, size = bytes.len(), "Stored image");
        images.insert(name.clone(), StoredImage { bytes, meta });

        Ok(name)
    }

    async fn get(&self, group: &str, name: &str, image_type: &str) -> Result<Bytes, ServiceError> {
        let (meta, bytes) = {
            let groups = self.groups.read().await;
            let stored = groups
                .get(group)
                .and_then(|images| images.get(name))
                .ok_or_else(|| {
                    DomainError::not_found(format!(
                        "image {}/{}.{} not found",
                        group, name, image_type
                    ))
                })?;
            (stored.meta.clone(), stored.bytes.clone())
        };

        Ok(represent(&meta, bytes, image_type)?)
    }

    async fn meta(&self, group: &str, name: &str) -> Result<serde_json::Value, ServiceError> {
        let groups = self.groups.read().await;
        let stored = groups
            .get(group)
            .and_then(|images| images.get(name))
            .ok_or_else(|| {
                DomainError::not_found(format!("image {}/{} not found", group, name))
            })?;

        serde_json::to_value(&stored.meta).map_err(ServiceError::internal)
    }

    async fn list(&self, group: &str) -> Result<Vec<String>, ServiceError> {
        let groups = self.groups.read().await;
        let mut names: Vec<String> = groups
            .get(group)
            .map(|images| images.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }
}

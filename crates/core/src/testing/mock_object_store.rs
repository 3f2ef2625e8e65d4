//! In-memory object store for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::storage::{ObjectStore, StorageError};

/// Mock implementation of the ObjectStore trait.
///
/// Locations are `mock://{bucket}/{key}`.
#[derive(Debug, Default)]
pub struct MockObjectStore {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    deleted: Arc<RwLock<Vec<String>>>,
    /// Puts whose `bucket/key` contains this text fail.
    fail_puts_matching: Arc<RwLock<Option<String>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn full_key(bucket: &str, key: &str) -> String {
        format!("{}/{}", bucket, key)
    }

    /// Get a stored object.
    pub async fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&Self::full_key(bucket, key))
            .cloned()
    }

    /// Number of objects currently stored.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// `bucket/key` of every delete, in order.
    pub async fn deleted_keys(&self) -> Vec<String> {
        self.deleted.read().await.clone()
    }

    /// Make puts fail when `bucket/key` contains `pattern`.
    pub async fn fail_puts_matching(&self, pattern: impl Into<String>) {
        *self.fail_puts_matching.write().await = Some(pattern.into());
    }

    /// Stop failing puts.
    pub async fn clear_failures(&self) {
        *self.fail_puts_matching.write().await = None;
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let full_key = Self::full_key(bucket, key);

        if let Some(pattern) = self.fail_puts_matching.read().await.as_deref() {
            if full_key.contains(pattern) {
                return Err(StorageError::Write {
                    key: full_key,
                    source: std::io::Error::other("mock put failure"),
                });
            }
        }

        self.objects
            .write()
            .await
            .insert(full_key.clone(), bytes.to_vec());
        Ok(format!("mock://{}", full_key))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let full_key = Self::full_key(bucket, key);
        self.objects.write().await.remove(&full_key);
        self.deleted.write().await.push(full_key);
        Ok(())
    }
}

//! Trait definitions for the storage module.

use async_trait::async_trait;

use super::StorageError;

/// An object store holding staged inputs and produced subtitle files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Store `bytes` under `bucket/key`, returning a retrievable location.
    async fn put_object(&self, bucket: &str, key: &str, bytes: &[u8])
        -> Result<String, StorageError>;

    /// Remove `bucket/key`. Deleting a missing object succeeds.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

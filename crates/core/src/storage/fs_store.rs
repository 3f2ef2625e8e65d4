//! Filesystem-backed object store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{ObjectStore, StorageConfig, StorageError};

/// Object store writing each bucket to a directory under a root.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never sees a partially written object.
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl FsObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
            public_base_url: config
                .public_base_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    /// Resolve `bucket/key` to a path under the root, refusing anything that
    /// would escape it.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let full_key = format!("{}/{}", bucket, key);
        let relative = Path::new(&full_key);

        if bucket.is_empty() || key.is_empty() {
            return Err(StorageError::InvalidKey {
                key: full_key.clone(),
                reason: "bucket and key must not be empty".to_string(),
            });
        }

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(StorageError::InvalidKey {
                key: full_key.clone(),
                reason: "must be a relative path without '..'".to_string(),
            });
        }

        Ok(self.root.join(relative))
    }

    fn location(&self, bucket: &str, key: &str, path: &Path) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}/{}", base, bucket, key),
            None => format!("file://{}", path.display()),
        }
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let path = self.object_path(bucket, key)?;
        let write_err = |source| StorageError::Write {
            key: format!("{}/{}", bucket, key),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let temp_path = path.with_extension(format!("partial-{}", uuid::Uuid::new_v4()));
        fs::write(&temp_path, bytes).await.map_err(write_err)?;
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(write_err(e));
        }

        debug!(bucket, key, bytes = bytes.len(), "Stored object");
        Ok(self.location(bucket, key, &path))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Delete {
                key: format!("{}/{}", bucket, key),
                source,
            }),
        }
    }
}

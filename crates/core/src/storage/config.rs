//! Configuration for object storage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the filesystem-backed object store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per bucket.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Bucket that staged inputs and produced subtitles are written to.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Public URL the root is served under. When unset, locations are `file://` URLs.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_root() -> PathBuf {
    PathBuf::from("objects")
}

fn default_bucket() -> String {
    "autosrt".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            bucket: default_bucket(),
            public_base_url: None,
        }
    }
}

//! Error types for the storage module.

use thiserror::Error;

/// Errors that can occur while storing objects.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Bucket or key is not acceptable.
    #[error("Invalid object key {key}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Write to the backing store failed.
    #[error("Failed to write object {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Delete from the backing store failed.
    #[error("Failed to delete object {key}: {source}")]
    Delete {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

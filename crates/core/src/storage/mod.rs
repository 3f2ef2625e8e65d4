//! Object storage collaborator.
//!
//! Used to stage uploaded media for the compute service and to persist
//! produced subtitle files.

mod config;
mod error;
mod fs_store;
mod traits;

pub use config::StorageConfig;
pub use error::StorageError;
pub use fs_store::FsObjectStore;
pub use traits::ObjectStore;

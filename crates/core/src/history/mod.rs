//! Record of completed conversions.

mod error;
mod sqlite;
mod store;
mod types;

pub use error::HistoryError;
pub use sqlite::SqliteHistoryStore;
pub use store::HistoryStore;
pub use types::{HistoryRecord, HistoryStatus};

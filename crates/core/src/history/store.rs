//! History storage trait.

use super::{HistoryError, HistoryRecord};

/// Append-only store of completed conversions.
pub trait HistoryStore: Send + Sync {
    /// Append a record. Fails with [`HistoryError::Duplicate`] when the
    /// (user, file) pair is already present.
    fn append(&self, record: &HistoryRecord) -> Result<(), HistoryError>;

    /// Get the record for a (user, file) pair.
    fn find(&self, user_id: &str, file_id: &str) -> Result<Option<HistoryRecord>, HistoryError>;

    /// List a user's records, newest first.
    fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HistoryRecord>, HistoryError>;

    /// Count a user's records.
    fn count_for_user(&self, user_id: &str) -> Result<u64, HistoryError>;
}

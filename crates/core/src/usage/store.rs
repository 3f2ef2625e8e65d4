//! Usage storage trait.

use super::{UsageError, UsageRecord, UserAccount};

/// Trait for usage storage backends.
///
/// Implementations must make `increment_usage` a single atomic operation:
/// callers never read a record, add to it and write it back.
pub trait UsageStore: Send + Sync {
    /// Look up a user account.
    fn find_user(&self, user_id: &str) -> Result<Option<UserAccount>, UsageError>;

    /// Look up a user's usage record.
    fn find_usage(&self, user_id: &str) -> Result<Option<UsageRecord>, UsageError>;

    /// Add `seconds` to both the monthly and lifetime counters, creating the
    /// record if it does not exist.
    fn increment_usage(&self, user_id: &str, seconds: f64) -> Result<(), UsageError>;
}

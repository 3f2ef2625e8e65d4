//! Error types for the usage ledger.

use thiserror::Error;

/// Errors that can occur while checking or recording usage.
#[derive(Debug, Error)]
pub enum UsageError {
    /// The user does not exist.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The user's stored plan is not recognised.
    #[error("Invalid plan for user {user_id}: {reason}")]
    InvalidPlan { user_id: String, reason: String },

    /// Duration was negative or not a finite number.
    #[error("Invalid duration: {0}")]
    InvalidDuration(f64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for UsageError {
    fn from(e: rusqlite::Error) -> Self {
        UsageError::Database(e.to_string())
    }
}

//! Error types for the history store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// A record for this (user, file) pair already exists.
    #[error("History record already exists for user {user_id}, file {file_id}")]
    Duplicate { user_id: String, file_id: String },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for HistoryError {
    fn from(e: rusqlite::Error) -> Self {
        HistoryError::Database(e.to_string())
    }
}

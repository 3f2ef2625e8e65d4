//! Error types for notifications.

use thiserror::Error;

/// Errors from sending a notification. Never fatal to a job.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to create notifier client: {0}")]
    Client(String),

    #[error("Notification request failed: {0}")]
    Request(String),

    #[error("Email API returned status {status_code}: {message}")]
    Status { status_code: u16, message: String },
}

impl NotifyError {
    pub fn kind(&self) -> &'static str {
        "notify"
    }
}

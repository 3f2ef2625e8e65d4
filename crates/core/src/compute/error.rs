//! Error types for the compute module.

use thiserror::Error;

/// Errors that can occur while invoking the compute service.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// HTTP client could not be constructed.
    #[error("Failed to create compute client: {0}")]
    Client(String),

    /// Could not reach the service.
    #[error("Compute request failed: {0}")]
    Request(String),

    /// The invocation did not finish in time.
    #[error("Compute invocation timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The service or function answered with a failure status.
    #[error("Compute function returned status {status_code}: {message}")]
    Status { status_code: u16, message: String },

    /// The response body could not be understood.
    #[error("Invalid compute response: {0}")]
    InvalidResponse(String),
}

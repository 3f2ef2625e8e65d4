//! Error types for the worker pool.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    /// The queue connection or a worker's delivery stream was lost.
    #[error("Queue connection lost: {0}")]
    ConnectionLost(String),

    /// `start` was called on a running pool.
    #[error("Worker pool already started")]
    AlreadyStarted,

    /// A worker task panicked.
    #[error("Worker {worker} panicked: {reason}")]
    WorkerPanicked { worker: usize, reason: String },
}

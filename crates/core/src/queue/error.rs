//! Error types for the queue module.

use thiserror::Error;

/// Errors raised by queue clients.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Could not connect to the broker.
    #[error("Failed to connect to queue: {0}")]
    Connection(String),

    /// Stream or consumer setup failed.
    #[error("Queue setup failed: {0}")]
    Setup(String),

    /// Publishing a message failed.
    #[error("Failed to publish message: {0}")]
    Publish(String),

    /// Receiving from the broker failed.
    #[error("Failed to receive message: {0}")]
    Receive(String),

    /// Settling (ack/nak/term) a message failed.
    #[error("Failed to settle message: {0}")]
    Settle(String),

    /// Envelope could not be serialized.
    #[error("Failed to encode envelope: {0}")]
    Encode(String),
}

//! Trait definitions for the queue module.

use async_trait::async_trait;
use bytes::Bytes;

use super::QueueError;
use crate::envelope::JobEnvelope;

/// A durable, at-least-once queue of conversion jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Returns the name of this queue implementation.
    fn name(&self) -> &str;

    /// Publish an envelope, returning once the broker has persisted it.
    async fn publish(&self, envelope: &JobEnvelope) -> Result<(), QueueError>;

    /// Open a delivery stream for one worker.
    ///
    /// Every message is delivered to exactly one open stream at a time.
    async fn receiver(&self) -> Result<Box<dyn DeliveryStream>, QueueError>;
}

/// Per-worker source of deliveries.
#[async_trait]
pub trait DeliveryStream: Send {
    /// Wait for the next delivery.
    ///
    /// Suspends until a message arrives. `Ok(None)` means the stream was
    /// closed by the broker and will not yield again.
    async fn next(&mut self) -> Result<Option<Delivery>, QueueError>;
}

/// Settles a single delivered message.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Processing succeeded; remove the message.
    async fn ack(&self) -> Result<(), QueueError>;

    /// Processing failed; make the message available for redelivery.
    async fn nak(&self) -> Result<(), QueueError>;

    /// The message must never be redelivered.
    async fn reject(&self) -> Result<(), QueueError>;
}

/// A message handed to a worker.
pub struct Delivery {
    payload: Bytes,
    delivery_count: u64,
    acker: Box<dyn Acknowledger>,
}

impl Delivery {
    pub fn new(payload: Bytes, delivery_count: u64, acker: Box<dyn Acknowledger>) -> Self {
        Self {
            payload,
            delivery_count,
            acker,
        }
    }

    /// Raw message bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// How many times the broker has delivered this message (1 on first delivery).
    pub fn delivery_count(&self) -> u64 {
        self.delivery_count
    }

    pub async fn ack(&self) -> Result<(), QueueError> {
        self.acker.ack().await
    }

    pub async fn nak(&self) -> Result<(), QueueError> {
        self.acker.nak().await
    }

    pub async fn reject(&self) -> Result<(), QueueError> {
        self.acker.reject().await
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("payload_len", &self.payload.len())
            .field("delivery_count", &self.delivery_count)
            .finish()
    }
}

//! In-memory job queue for testing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::envelope::JobEnvelope;
use crate::queue::{Acknowledger, Delivery, DeliveryStream, JobQueue, QueueError};

/// How a delivered message was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Acked,
    Nacked,
    Rejected,
}

/// A settlement recorded by the mock queue.
#[derive(Debug, Clone)]
pub struct RecordedSettlement {
    /// Sequence number assigned when the message was published.
    pub sequence: u64,
    pub settlement: Settlement,
    pub delivery_count: u64,
}

#[derive(Debug, Clone)]
struct QueuedMessage {
    sequence: u64,
    payload: Bytes,
    delivery_count: u64,
}

/// Mock implementation of the JobQueue trait.
///
/// All receivers share one FIFO, so each message goes to exactly one worker.
/// Nacked messages are put back with their delivery count incremented.
/// Closing the queue ends every open delivery stream, which workers treat as
/// a lost connection.
///
/// # Example
///
/// ```rust,ignore
/// use autosrt_core::testing::{fixtures, MockQueue};
///
/// let queue = MockQueue::new();
/// queue.publish(&fixtures::inline_envelope("f1", "u1", 60.0)).await?;
/// queue.push_raw(b"not json".to_vec()).await;
///
/// // ... run a worker pool against it ...
///
/// queue.wait_for_settlements(2, Duration::from_secs(5)).await;
/// assert_eq!(queue.acked_count().await, 1);
/// assert_eq!(queue.rejected_count().await, 1);
/// ```
pub struct MockQueue {
    tx: RwLock<Option<mpsc::UnboundedSender<QueuedMessage>>>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<QueuedMessage>>>,
    next_sequence: AtomicU64,
    settlements: Arc<RwLock<Vec<RecordedSettlement>>>,
    receivers_opened: AtomicU64,
    /// If set, the next receiver() call fails with this error.
    next_receiver_error: RwLock<Option<QueueError>>,
}

impl Default for MockQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MockQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: RwLock::new(Some(tx)),
            rx: Arc::new(Mutex::new(rx)),
            next_sequence: AtomicU64::new(1),
            settlements: Arc::new(RwLock::new(Vec::new())),
            receivers_opened: AtomicU64::new(0),
            next_receiver_error: RwLock::new(None),
        }
    }

    /// Enqueue raw bytes, bypassing envelope encoding. Returns the sequence number.
    pub async fn push_raw(&self, payload: impl Into<Bytes>) -> u64 {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self.tx.read().await.as_ref() {
            let _ = tx.send(QueuedMessage {
                sequence,
                payload: payload.into(),
                delivery_count: 1,
            });
        }
        sequence
    }

    /// Close the queue. Open delivery streams end once drained.
    pub async fn close(&self) {
        self.tx.write().await.take();
    }

    /// Configure the next receiver() call to fail.
    pub async fn set_next_receiver_error(&self, error: QueueError) {
        *self.next_receiver_error.write().await = Some(error);
    }

    /// Number of delivery streams opened so far.
    pub fn receivers_opened(&self) -> u64 {
        self.receivers_opened.load(Ordering::SeqCst)
    }

    /// All settlements, in the order they happened.
    pub async fn settlements(&self) -> Vec<RecordedSettlement> {
        self.settlements.read().await.clone()
    }

    /// Settlements recorded for one message.
    pub async fn settlements_for(&self, sequence: u64) -> Vec<Settlement> {
        self.settlements
            .read()
            .await
            .iter()
            .filter(|s| s.sequence == sequence)
            .map(|s| s.settlement)
            .collect()
    }

    pub async fn acked_count(&self) -> usize {
        self.count(Settlement::Acked).await
    }

    pub async fn nacked_count(&self) -> usize {
        self.count(Settlement::Nacked).await
    }

    pub async fn rejected_count(&self) -> usize {
        self.count(Settlement::Rejected).await
    }

    async fn count(&self, kind: Settlement) -> usize {
        self.settlements
            .read()
            .await
            .iter()
            .filter(|s| s.settlement == kind)
            .count()
    }

    /// Wait until at least `count` settlements have been recorded.
    ///
    /// Returns false on timeout.
    pub async fn wait_for_settlements(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.settlements.read().await.len() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl JobQueue for MockQueue {
    fn name(&self) -> &str {
        "mock"
    }

    async fn publish(&self, envelope: &JobEnvelope) -> Result<(), QueueError> {
        let payload = envelope
            .encode()
            .map_err(|e| QueueError::Encode(e.to_string()))?;
        if self.tx.read().await.is_none() {
            return Err(QueueError::Publish("queue closed".to_string()));
        }
        self.push_raw(payload).await;
        Ok(())
    }

    async fn receiver(&self) -> Result<Box<dyn DeliveryStream>, QueueError> {
        if let Some(error) = self.next_receiver_error.write().await.take() {
            return Err(error);
        }
        let requeue = self.tx.read().await.as_ref().map(|tx| tx.downgrade());
        self.receivers_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDeliveryStream {
            rx: Arc::clone(&self.rx),
            requeue,
            settlements: Arc::clone(&self.settlements),
        }))
    }
}

struct MockDeliveryStream {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<QueuedMessage>>>,
    // Weak so that closing the queue ends the stream.
    requeue: Option<mpsc::WeakUnboundedSender<QueuedMessage>>,
    settlements: Arc<RwLock<Vec<RecordedSettlement>>>,
}

#[async_trait]
impl DeliveryStream for MockDeliveryStream {
    async fn next(&mut self) -> Result<Option<Delivery>, QueueError> {
        let message = {
            let mut rx = self.rx.lock().await;
            rx.recv().await
        };

        Ok(message.map(|message| {
            let payload = message.payload.clone();
            let delivery_count = message.delivery_count;
            Delivery::new(
                payload,
                delivery_count,
                Box::new(MockAcknowledger {
                    message,
                    requeue: self.requeue.clone(),
                    settlements: Arc::clone(&self.settlements),
                }),
            )
        }))
    }
}

struct MockAcknowledger {
    message: QueuedMessage,
    requeue: Option<mpsc::WeakUnboundedSender<QueuedMessage>>,
    settlements: Arc<RwLock<Vec<RecordedSettlement>>>,
}

impl MockAcknowledger {
    async fn record(&self, settlement: Settlement) {
        self.settlements.write().await.push(RecordedSettlement {
            sequence: self.message.sequence,
            settlement,
            delivery_count: self.message.delivery_count,
        });
    }
}

#[async_trait]
impl Acknowledger for MockAcknowledger {
    async fn ack(&self) -> Result<(), QueueError> {
        self.record(Settlement::Acked).await;
        Ok(())
    }

    async fn nak(&self) -> Result<(), QueueError> {
        self.record(Settlement::Nacked).await;
        if let Some(tx) = self.requeue.as_ref().and_then(|weak| weak.upgrade()) {
            let mut redelivery = self.message.clone();
            redelivery.delivery_count += 1;
            let _ = tx.send(redelivery);
        }
        Ok(())
    }

    async fn reject(&self) -> Result<(), QueueError> {
        self.record(Settlement::Rejected).await;
        Ok(())
    }
}

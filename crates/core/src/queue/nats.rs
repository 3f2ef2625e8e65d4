//! NATS JetStream implementation of the job queue.

use std::time::Duration;

use async_nats::jetstream::{
    self,
    consumer::{pull, AckPolicy, PullConsumer},
    message::Acker,
    stream::{self, RetentionPolicy},
    AckKind,
};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info};

use super::{Acknowledger, Delivery, DeliveryStream, JobQueue, QueueConfig, QueueError};
use crate::envelope::JobEnvelope;

/// Job queue backed by a JetStream work-queue stream and one durable pull
/// consumer shared by all workers.
pub struct NatsJobQueue {
    context: jetstream::Context,
    consumer: PullConsumer,
    subject: String,
}

impl NatsJobQueue {
    /// Connect to NATS and make sure the stream and durable consumer exist.
    pub async fn connect(config: &QueueConfig) -> Result<Self, QueueError> {
        info!(url = %config.url, "Connecting to NATS");

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        let context = jetstream::new(client);

        let stream = context
            .get_or_create_stream(stream::Config {
                name: config.stream.clone(),
                subjects: vec![config.subject.clone()],
                retention: RetentionPolicy::WorkQueue,
                description: Some("Subtitle conversion jobs".to_string()),
                ..Default::default()
            })
            .await
            .map_err(|e| QueueError::Setup(format!("stream {}: {}", config.stream, e)))?;

        let consumer: PullConsumer = stream
            .get_or_create_consumer(
                &config.consumer,
                pull::Config {
                    durable_name: Some(config.consumer.clone()),
                    filter_subject: config.subject.clone(),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(config.ack_wait_secs),
                    max_deliver: config.max_deliver,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| QueueError::Setup(format!("consumer {}: {}", config.consumer, e)))?;

        info!(
            stream = %config.stream,
            consumer = %config.consumer,
            subject = %config.subject,
            "JetStream work queue ready"
        );

        Ok(Self {
            context,
            consumer,
            subject: config.subject.clone(),
        })
    }
}

#[async_trait]
impl JobQueue for NatsJobQueue {
    fn name(&self) -> &str {
        "nats-jetstream"
    }

    async fn publish(&self, envelope: &JobEnvelope) -> Result<(), QueueError> {
        let payload = envelope
            .encode()
            .map_err(|e| QueueError::Encode(e.to_string()))?;

        let ack = self
            .context
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|e| QueueError::Publish(e.to_string()))?;

        ack.await.map_err(|e| QueueError::Publish(e.to_string()))?;
        debug!(file_id = %envelope.file_id, subject = %self.subject, "Published job");
        Ok(())
    }

    async fn receiver(&self) -> Result<Box<dyn DeliveryStream>, QueueError> {
        // One message per pull keeps a worker from holding jobs it is not processing.
        let messages = self
            .consumer
            .stream()
            .max_messages_per_batch(1)
            .messages()
            .await
            .map_err(|e| QueueError::Receive(e.to_string()))?;

        Ok(Box::new(NatsDeliveryStream { messages }))
    }
}

struct NatsDeliveryStream {
    messages: pull::Stream,
}

#[async_trait]
impl DeliveryStream for NatsDeliveryStream {
    async fn next(&mut self) -> Result<Option<Delivery>, QueueError> {
        let Some(result) = self.messages.next().await else {
            return Ok(None);
        };

        let message = result.map_err(|e| QueueError::Receive(e.to_string()))?;
        let delivery_count = message
            .info()
            .map(|info| info.delivered.max(1) as u64)
            .unwrap_or(1);

        let (message, acker) = message.split();
        Ok(Some(Delivery::new(
            message.payload,
            delivery_count,
            Box::new(NatsAcknowledger { acker }),
        )))
    }
}

struct NatsAcknowledger {
    acker: Acker,
}

#[async_trait]
impl Acknowledger for NatsAcknowledger {
    async fn ack(&self) -> Result<(), QueueError> {
        self.acker
            .ack()
            .await
            .map_err(|e| QueueError::Settle(e.to_string()))
    }

    async fn nak(&self) -> Result<(), QueueError> {
        self.acker
            .ack_with(AckKind::Nak(None))
            .await
            .map_err(|e| QueueError::Settle(e.to_string()))
    }

    async fn reject(&self) -> Result<(), QueueError> {
        self.acker
            .ack_with(AckKind::Term)
            .await
            .map_err(|e| QueueError::Settle(e.to_string()))
    }
}

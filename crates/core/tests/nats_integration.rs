#![cfg(feature = "integration-tests")]

//! JetStream settlement tests.
//!
//! Need a NATS server with JetStream enabled, e.g.
//! `docker run -p 4222:4222 nats -js`, then
//! `cargo test -p autosrt-core --features integration-tests`.

use std::time::Duration;

use autosrt_core::queue::{DeliveryStream, QueueConfig};
use autosrt_core::testing::fixtures;
use autosrt_core::{JobQueue, NatsJobQueue};

const ACK_WAIT_SECS: u64 = 2;

fn nats_url() -> String {
    std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string())
}

/// Config for a stream and consumer no other test touches.
fn isolated_config() -> QueueConfig {
    let id = uuid::Uuid::new_v4().simple().to_string();
    QueueConfig {
        url: nats_url(),
        stream: format!("AUTOSRT_TEST_{}", id),
        subject: format!("autosrt.test.{}", id),
        consumer: format!("workers-{}", id),
        ack_wait_secs: ACK_WAIT_SECS,
        ..Default::default()
    }
}

async fn delete_stream(config: &QueueConfig) {
    let client = async_nats::connect(&config.url)
        .await
        .expect("Failed to connect for cleanup");
    let _ = async_nats::jetstream::new(client)
        .delete_stream(&config.stream)
        .await;
}

/// Next delivery, or `None` if nothing arrives within `wait`.
async fn next_within(
    stream: &mut Box<dyn DeliveryStream>,
    wait: Duration,
) -> Option<autosrt_core::queue::Delivery> {
    match tokio::time::timeout(wait, stream.next()).await {
        Ok(result) => result.expect("Receive failed"),
        Err(_) => None,
    }
}

#[tokio::test]
async fn test_nak_redelivers_with_incremented_count() {
    let config = isolated_config();
    let queue = NatsJobQueue::connect(&config)
        .await
        .expect("Failed to connect to NATS");
    let envelope = fixtures::inline_envelope("f1", "u1", 30.0);
    queue.publish(&envelope).await.expect("Publish failed");

    let mut stream = queue.receiver().await.expect("Failed to open receiver");

    let first = next_within(&mut stream, Duration::from_secs(5))
        .await
        .expect("Job was not delivered");
    assert_eq!(first.delivery_count(), 1);
    first.nak().await.expect("Nak failed");

    // Nak asks for redelivery right away, well before the ack wait expires
    let second = next_within(&mut stream, Duration::from_secs(ACK_WAIT_SECS - 1))
        .await
        .expect("Nak'd job was not redelivered");
    assert_eq!(second.delivery_count(), 2);
    assert_eq!(second.payload(), envelope.encode().unwrap().as_slice());
    second.ack().await.expect("Ack failed");

    assert!(next_within(&mut stream, Duration::from_secs(ACK_WAIT_SECS + 1))
        .await
        .is_none());

    delete_stream(&config).await;
}

#[tokio::test]
async fn test_reject_is_never_redelivered() {
    let config = isolated_config();
    let queue = NatsJobQueue::connect(&config)
        .await
        .expect("Failed to connect to NATS");
    queue
        .publish(&fixtures::inline_envelope("f1", "u1", 30.0))
        .await
        .expect("Publish failed");

    let mut stream = queue.receiver().await.expect("Failed to open receiver");

    let delivery = next_within(&mut stream, Duration::from_secs(5))
        .await
        .expect("Job was not delivered");
    delivery.reject().await.expect("Reject failed");

    // An unsettled or nak'd message would be back after the ack wait
    let redelivered = next_within(&mut stream, Duration::from_secs(ACK_WAIT_SECS * 2)).await;
    assert!(redelivered.is_none(), "rejected job came back: {:?}", redelivered);

    delete_stream(&config).await;
}

#[tokio::test]
async fn test_unsettled_job_is_redelivered_after_ack_wait() {
    let config = isolated_config();
    let queue = NatsJobQueue::connect(&config)
        .await
        .expect("Failed to connect to NATS");
    queue
        .publish(&fixtures::inline_envelope("f1", "u1", 30.0))
        .await
        .expect("Publish failed");

    let mut stream = queue.receiver().await.expect("Failed to open receiver");

    let first = next_within(&mut stream, Duration::from_secs(5))
        .await
        .expect("Job was not delivered");
    assert_eq!(first.delivery_count(), 1);
    drop(first);

    let second = next_within(&mut stream, Duration::from_secs(ACK_WAIT_SECS * 3))
        .await
        .expect("Unsettled job was not redelivered");
    assert_eq!(second.delivery_count(), 2);
    second.ack().await.expect("Ack failed");

    delete_stream(&config).await;
}

//! Configuration for the job queue.

use serde::{Deserialize, Serialize};

/// Configuration for the NATS JetStream work queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// NATS server URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// JetStream stream holding conversion jobs.
    #[serde(default = "default_stream")]
    pub stream: String,

    /// Subject jobs are published on.
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Durable consumer shared by all workers.
    #[serde(default = "default_consumer")]
    pub consumer: String,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How long the server waits for an ack before redelivering, in seconds.
    /// Must exceed the longest expected conversion.
    #[serde(default = "default_ack_wait")]
    pub ack_wait_secs: u64,

    /// Maximum deliveries per message before the server gives up on it.
    #[serde(default = "default_max_deliver")]
    pub max_deliver: i64,
}

fn default_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_stream() -> String {
    "CONVERSIONS".to_string()
}

fn default_subject() -> String {
    "conversions.jobs".to_string()
}

fn default_consumer() -> String {
    "srt-workers".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_ack_wait() -> u64 {
    1800 // 30 minutes
}

fn default_max_deliver() -> i64 {
    3
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            stream: default_stream(),
            subject: default_subject(),
            consumer: default_consumer(),
            connect_timeout_secs: default_connect_timeout(),
            ack_wait_secs: default_ack_wait(),
            max_deliver: default_max_deliver(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueueConfig::default();
        assert_eq!(config.stream, "CONVERSIONS");
        assert_eq!(config.subject, "conversions.jobs");
        assert_eq!(config.max_deliver, 3);
        assert_eq!(config.ack_wait_secs, 1800);
    }
}

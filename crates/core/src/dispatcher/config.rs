//! Worker pool configuration.

use serde::{Deserialize, Serialize};

/// How a job whose handler failed is settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureDisposition {
    /// Terminate the message; it is never redelivered.
    #[default]
    Reject,
    /// Negatively acknowledge; the queue's redelivery policy applies.
    Requeue,
}

/// Configuration for the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Number of concurrent workers.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub failure_disposition: FailureDisposition,
}

fn default_concurrency() -> usize {
    5
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            failure_disposition: FailureDisposition::default(),
        }
    }
}

impl DispatcherConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_failure_disposition(mut self, disposition: FailureDisposition) -> Self {
        self.failure_disposition = disposition;
        self
    }
}

//! Mock notifier for testing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::notify::{Notifier, NotifyError};

/// A notification attempt recorded for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedNotification {
    pub address: String,
    pub artifact_location: String,
    pub succeeded: bool,
}

/// Mock implementation of the Notifier trait.
///
/// Records every attempt, including failed ones.
#[derive(Debug, Default)]
pub struct MockNotifier {
    attempts: Arc<RwLock<Vec<RecordedNotification>>>,
    fail: Arc<RwLock<bool>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send fails.
    pub fn failing() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(Vec::new())),
            fail: Arc::new(RwLock::new(true)),
        }
    }

    pub async fn set_failing(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    pub async fn attempts(&self) -> Vec<RecordedNotification> {
        self.attempts.read().await.clone()
    }

    /// Wait until at least `count` attempts have been recorded.
    ///
    /// Notifications run detached from the worker, so tests poll for them.
    pub async fn wait_for_attempts(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.attempts.read().await.len() >= count {
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
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_conversion_complete(
        &self,
        address: &str,
        artifact_location: &str,
    ) -> Result<(), NotifyError> {
        let fail = *self.fail.read().await;
        self.attempts.write().await.push(RecordedNotification {
            address: address.to_string(),
            artifact_location: artifact_location.to_string(),
            succeeded: !fail,
        });

        if fail {
            return Err(NotifyError::Status {
                status_code: 503,
                message: "mock email outage".to_string(),
            });
        }
        Ok(())
    }
}

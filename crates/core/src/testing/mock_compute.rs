//! Mock compute service for testing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::compute::{ComputeError, ComputeRequest, ComputeResponse, ComputeService};

use super::fixtures;

/// A recorded invocation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    pub function_name: String,
    pub request: ComputeRequest,
}

/// Mock implementation of the ComputeService trait.
///
/// Returns an inline subtitle by default. Configure a different response,
/// a one-shot error, or a delay to simulate slow transcription.
#[derive(Debug)]
pub struct MockComputeService {
    calls: Arc<RwLock<Vec<RecordedInvocation>>>,
    response: Arc<RwLock<ComputeResponse>>,
    /// If set, the next invocation fails with this error.
    next_error: Arc<RwLock<Option<ComputeError>>>,
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockComputeService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockComputeService {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            response: Arc::new(RwLock::new(fixtures::subtitle_response())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Set the response returned by every invocation.
    pub async fn set_response(&self, response: ComputeResponse) {
        *self.response.write().await = response;
    }

    /// Configure the next invocation to fail with the given error.
    pub async fn set_next_error(&self, error: ComputeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set how long each invocation takes.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Get all recorded invocations.
    pub async fn recorded_calls(&self) -> Vec<RecordedInvocation> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl ComputeService for MockComputeService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn invoke(
        &self,
        function_name: &str,
        request: &ComputeRequest,
    ) -> Result<ComputeResponse, ComputeError> {
        self.calls.write().await.push(RecordedInvocation {
            function_name: function_name.to_string(),
            request: request.clone(),
        });

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(self.response.read().await.clone())
    }
}

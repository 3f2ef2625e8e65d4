//! Trait definitions for the worker pool.

use async_trait::async_trait;

use crate::envelope::JobEnvelope;
use crate::orchestrator::JobError;

/// What a successful job produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// Where the user can fetch the result; sent in the completion notification.
    pub artifact_location: String,
}

/// Processes one decoded job.
///
/// Called by exactly one worker per delivery, with no timeout imposed by the
/// pool. Any error counts as a job failure.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, envelope: &JobEnvelope) -> Result<JobOutcome, JobError>;
}

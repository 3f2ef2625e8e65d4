//! Job handler run by the worker pool for each decoded envelope.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::dispatcher::{JobHandler, JobOutcome};
use crate::envelope::JobEnvelope;
use crate::metrics;
use crate::telemetry::{FailureReport, TelemetryHandle, ACTION_USAGE_RECORDING};
use crate::usage::UsageLedger;

use super::{ConversionOrchestrator, ConversionRequest, JobError};

/// Checks quota, converts, then records usage.
pub struct SubtitleJobHandler {
    ledger: UsageLedger,
    orchestrator: Arc<ConversionOrchestrator>,
    telemetry: Option<TelemetryHandle>,
}

impl SubtitleJobHandler {
    pub fn new(ledger: UsageLedger, orchestrator: Arc<ConversionOrchestrator>) -> Self {
        Self {
            ledger,
            orchestrator,
            telemetry: None,
        }
    }

    /// Report usage-recording failures to telemetry.
    pub fn with_telemetry(mut self, telemetry: TelemetryHandle) -> Self {
        self.telemetry = Some(telemetry);
        self
    }
}

#[async_trait]
impl JobHandler for SubtitleJobHandler {
    async fn handle(&self, envelope: &JobEnvelope) -> Result<JobOutcome, JobError> {
        // A redelivery must not be refused by a quota its first run consumed
        if let Some(existing) = self
            .orchestrator
            .find_completed(&envelope.user_id, &envelope.file_id)?
        {
            info!(
                file_id = %envelope.file_id,
                user_id = %envelope.user_id,
                "Job already completed by an earlier delivery"
            );
            return Ok(JobOutcome {
                artifact_location: existing.artifact_location,
            });
        }

        let allowed = self
            .ledger
            .check_limit(&envelope.user_id, envelope.file_duration)
            .map_err(JobError::QuotaLookup)?;

        if !allowed {
            metrics::QUOTA_REJECTIONS.inc();
            return Err(JobError::QuotaExceeded {
                user_id: envelope.user_id.clone(),
                requested_secs: envelope.file_duration,
            });
        }

        let result = self
            .orchestrator
            .convert(ConversionRequest::from_envelope(envelope))
            .await?;

        if result.already_recorded {
            info!(
                file_id = %envelope.file_id,
                user_id = %envelope.user_id,
                "Job already completed by an earlier delivery, usage not recorded again"
            );
            return Ok(JobOutcome {
                artifact_location: result.artifact_location,
            });
        }

        // The subtitle exists and history is written; a lost increment only
        // under-counts usage, so it is reported rather than failing the job.
        if let Err(e) = self
            .ledger
            .record_usage(&envelope.user_id, envelope.file_duration)
        {
            error!(
                file_id = %envelope.file_id,
                user_id = %envelope.user_id,
                duration_secs = envelope.file_duration,
                error = %e,
                "Failed to record usage"
            );
            if let Some(telemetry) = &self.telemetry {
                telemetry
                    .report(FailureReport::for_job(
                        envelope,
                        ACTION_USAGE_RECORDING,
                        "usage_record",
                        e.to_string(),
                    ))
                    .await;
            }
        }

        debug!(
            file_id = %envelope.file_id,
            status = result.status.code,
            "Handler finished"
        );

        Ok(JobOutcome {
            artifact_location: result.artifact_location,
        })
    }
}

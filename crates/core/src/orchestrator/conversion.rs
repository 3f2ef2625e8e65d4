//! The conversion orchestrator.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::compute::{ComputeRequest, ComputeResponse, ComputeService};
use crate::history::{HistoryError, HistoryRecord, HistoryStatus, HistoryStore};
use crate::metrics;
use crate::storage::ObjectStore;

use super::{
    ConversionError, ConversionRequest, ConversionResult, ConversionStatus, OrchestratorConfig,
    PayloadSource,
};

/// Turns a conversion request into a stored subtitle file and a history entry.
///
/// Steps, in order: stage the input, invoke the compute function, persist an
/// inline subtitle, append the history record. A request whose history record
/// already exists returns that record's artifact without converting again.
/// Quota is not checked here.
pub struct ConversionOrchestrator {
    config: OrchestratorConfig,
    bucket: String,
    function_name: String,
    storage: Arc<dyn ObjectStore>,
    compute: Arc<dyn ComputeService>,
    history: Arc<dyn HistoryStore>,
}

impl ConversionOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        bucket: impl Into<String>,
        function_name: impl Into<String>,
        storage: Arc<dyn ObjectStore>,
        compute: Arc<dyn ComputeService>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            config,
            bucket: bucket.into(),
            function_name: function_name.into(),
            storage,
            compute,
            history,
        }
    }

    pub async fn convert(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionResult, ConversionError> {
        let started = Instant::now();

        // Redelivery of a job whose conversion already completed
        if let Some(existing) = self.find_completed(&request.user_id, &request.file_id)? {
            info!(
                file_id = %request.file_id,
                user_id = %request.user_id,
                artifact_location = %existing.artifact_location,
                "Conversion already completed, skipping"
            );
            return Ok(ConversionResult {
                artifact_location: existing.artifact_location,
                staged_location: None,
                status: ConversionStatus {
                    code: 200,
                    message: Some("already converted".to_string()),
                },
                elapsed: started.elapsed(),
                already_recorded: true,
            });
        }

        let input_key = request.input_key();

        let (staged_location, staged_here) = match &request.payload {
            PayloadSource::Bytes(bytes) => {
                let location = self
                    .storage
                    .put_object(&self.bucket, &input_key, bytes)
                    .await
                    .map_err(ConversionError::Staging)?;
                debug!(file_id = %request.file_id, location = %location, "Staged input");
                (location, true)
            }
            PayloadSource::Stored(location) => (location.clone(), false),
        };

        let compute_request = ComputeRequest {
            location: staged_location.clone(),
            file_name: request.file_name.clone(),
            options: request.options.clone(),
        };

        let response = match self.invoke_compute(&compute_request).await {
            Ok(response) => response,
            Err(e) => {
                if staged_here && self.config.cleanup_staged_on_failure {
                    self.discard_staged(&input_key).await;
                }
                return Err(e);
            }
        };

        let artifact_location = match (&response.subtitle, &response.artifact_location) {
            (Some(subtitle), _) => self
                .storage
                .put_object(&self.bucket, &request.subtitle_key(), subtitle.as_bytes())
                .await
                .map_err(|e| ConversionError::Persistence(e.to_string()))?,
            (None, Some(location)) => location.clone(),
            // invoke_compute rejects responses without output
            (None, None) => {
                return Err(ConversionError::Compute(
                    "response has no subtitle output".to_string(),
                ))
            }
        };

        let already_recorded = self.append_history(&request, &artifact_location)?;

        let elapsed = started.elapsed();
        info!(
            file_id = %request.file_id,
            user_id = %request.user_id,
            artifact_location = %artifact_location,
            elapsed_ms = elapsed.as_millis() as u64,
            "Conversion completed"
        );

        Ok(ConversionResult {
            artifact_location,
            staged_location: Some(staged_location),
            status: ConversionStatus {
                code: response.status_code,
                message: response.message,
            },
            elapsed,
            already_recorded,
        })
    }

    /// The history record of an earlier completed conversion, if any.
    pub fn find_completed(
        &self,
        user_id: &str,
        file_id: &str,
    ) -> Result<Option<HistoryRecord>, ConversionError> {
        self.history
            .find(user_id, file_id)
            .map_err(|e| ConversionError::Persistence(e.to_string()))
    }

    async fn invoke_compute(
        &self,
        request: &ComputeRequest,
    ) -> Result<ComputeResponse, ConversionError> {
        let started = Instant::now();
        let result = self.compute.invoke(&self.function_name, request).await;
        let elapsed = started.elapsed().as_secs_f64();

        let checked = match result {
            Err(e) => Err(ConversionError::Compute(e.to_string())),
            Ok(response) if !response.is_success() => Err(ConversionError::Compute(format!(
                "function returned status {}: {}",
                response.status_code,
                response.message.as_deref().unwrap_or("no message")
            ))),
            Ok(response) if !response.has_output() => Err(ConversionError::Compute(
                "response has neither an artifact location nor subtitle content".to_string(),
            )),
            Ok(response) => Ok(response),
        };

        let label = if checked.is_ok() { "success" } else { "failure" };
        metrics::COMPUTE_DURATION
            .with_label_values(&[label])
            .observe(elapsed);

        checked
    }

    async fn discard_staged(&self, key: &str) {
        if let Err(e) = self.storage.delete_object(&self.bucket, key).await {
            warn!(key, error = %e, "Failed to delete staged input");
        }
    }

    /// Returns `true` when a concurrent delivery wrote the record first.
    fn append_history(
        &self,
        request: &ConversionRequest,
        artifact_location: &str,
    ) -> Result<bool, ConversionError> {
        let record = HistoryRecord {
            user_id: request.user_id.clone(),
            file_id: request.file_id.clone(),
            file_name: request.file_name.clone(),
            duration_secs: request.file_duration,
            artifact_location: artifact_location.to_string(),
            status: HistoryStatus::Completed,
            created_at: Utc::now(),
        };

        match self.history.append(&record) {
            Ok(()) => Ok(false),
            Err(HistoryError::Duplicate { .. }) => {
                warn!(
                    file_id = %request.file_id,
                    user_id = %request.user_id,
                    "History record already present, keeping the existing entry"
                );
                Ok(true)
            }
            Err(e) => Err(ConversionError::Persistence(e.to_string())),
        }
    }
}

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::{TelemetryEvent, TelemetryEventEnvelope, TelemetryHandle, TelemetryRecord, TelemetryStore};

/// Background task that logs telemetry events and writes them to storage
pub struct TelemetryWriter {
    rx: mpsc::Receiver<TelemetryEventEnvelope>,
    store: Arc<dyn TelemetryStore>,
}

impl TelemetryWriter {
    pub fn new(rx: mpsc::Receiver<TelemetryEventEnvelope>, store: Arc<dyn TelemetryStore>) -> Self {
        Self { rx, store }
    }

    /// Run until every [`TelemetryHandle`] has been dropped.
    pub async fn run(mut self) {
        info!("Telemetry writer started");

        while let Some(envelope) = self.rx.recv().await {
            if let TelemetryEvent::JobFailed(report) = &envelope.event {
                warn!(
                    component = %report.tags.component,
                    service = %report.tags.service,
                    action = %report.tags.action,
                    error_kind = %report.error_kind,
                    file_id = report.file_id().unwrap_or("-"),
                    user_id = report.user_id().unwrap_or("-"),
                    error = %report.error_message,
                    "Failure reported"
                );
            }

            let record = TelemetryRecord {
                id: 0,
                timestamp: envelope.timestamp,
                event_type: envelope.event.event_type().to_string(),
                file_id: envelope.event.file_id().map(String::from),
                user_id: envelope.event.user_id().map(String::from),
                error_kind: envelope.event.error_kind().map(String::from),
                data: envelope.event,
            };

            if let Err(e) = self.store.insert(&record) {
                error!("Failed to write telemetry event: {}", e);
            }
        }

        info!("Telemetry writer shutting down");
    }
}

/// Create a handle and the writer that drains it.
///
/// Spawn the writer with `tokio::spawn(writer.run())`. It stops once all
/// handle clones are dropped.
pub fn create_telemetry_system(
    store: Arc<dyn TelemetryStore>,
    buffer_size: usize,
) -> (TelemetryHandle, TelemetryWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (TelemetryHandle::new(tx), TelemetryWriter::new(rx, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{FailureReport, SqliteTelemetryStore, TelemetryFilter};

    #[tokio::test]
    async fn test_writer_persists_reports() {
        let store = Arc::new(SqliteTelemetryStore::in_memory().unwrap());
        let (handle, writer) = create_telemetry_system(store.clone(), 10);
        let writer_handle = tokio::spawn(writer.run());

        handle
            .emit(TelemetryEvent::ServiceStarted {
                version: "0.1.0".to_string(),
                config_hash: "abc".to_string(),
            })
            .await;
        handle
            .report(FailureReport::for_poison_message("truncated"))
            .await;

        drop(handle);
        writer_handle.await.unwrap();

        assert_eq!(store.count(&TelemetryFilter::new()).unwrap(), 2);
        let failures = store
            .query(&TelemetryFilter::new().with_event_type("job_failed"))
            .unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].error_kind.as_deref(), Some("decode"));
    }
}

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::{FailureReport, TelemetryEvent};

/// Envelope wrapping a telemetry event with metadata
#[derive(Debug, Clone)]
pub struct TelemetryEventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: TelemetryEvent,
}

/// Handle for emitting telemetry events
///
/// Cheaply cloneable. Events are sent through a channel and written by the
/// [`TelemetryWriter`](super::TelemetryWriter). Emitting never fails the caller.
#[derive(Clone)]
pub struct TelemetryHandle {
    tx: mpsc::Sender<TelemetryEventEnvelope>,
}

impl TelemetryHandle {
    pub fn new(tx: mpsc::Sender<TelemetryEventEnvelope>) -> Self {
        Self { tx }
    }

    /// Emit an event, waiting for channel capacity.
    pub async fn emit(&self, event: TelemetryEvent) {
        let envelope = TelemetryEventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        if let Err(e) = self.tx.send(envelope).await {
            tracing::error!("Failed to emit telemetry event: {}", e);
        }
    }

    /// Try to emit an event without waiting.
    ///
    /// Returns true if the event was queued.
    pub fn try_emit(&self, event: TelemetryEvent) -> bool {
        let envelope = TelemetryEventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to emit telemetry event: {}", e);
                false
            }
        }
    }

    /// Report a job failure.
    pub async fn report(&self, report: FailureReport) {
        self.emit(TelemetryEvent::JobFailed(report)).await;
    }
}

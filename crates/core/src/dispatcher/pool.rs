//! Fixed-size worker pool pulling jobs from the queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::envelope::JobEnvelope;
use crate::metrics;
use crate::notify::Notifier;
use crate::orchestrator::JobError;
use crate::queue::{Delivery, DeliveryStream, JobQueue};
use crate::telemetry::{FailureReport, TelemetryHandle, ACTION_SRT_PROCESSING};

use super::types::PoolStats;
use super::{DispatcherConfig, DispatcherError, FailureDisposition, JobHandler, JobOutcome, PoolStatus};

type WorkerTask = JoinHandle<Result<(), DispatcherError>>;

/// A fixed number of workers, each pulling one job at a time from its own
/// delivery stream.
///
/// Successful jobs are acknowledged before anything else happens. The
/// completion notification runs detached, so its outcome never affects the
/// message. Failed jobs are reported to telemetry, then settled according
/// to [`FailureDisposition`]. Undecodable messages are rejected without
/// reaching the handler.
pub struct WorkerPool {
    config: DispatcherConfig,
    queue: Arc<dyn JobQueue>,
    handler: Arc<dyn JobHandler>,
    notifier: Option<Arc<dyn Notifier>>,
    telemetry: Option<TelemetryHandle>,
    stats: Arc<PoolStats>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    workers: Mutex<Vec<(usize, WorkerTask)>>,
}

impl WorkerPool {
    pub fn new(
        config: DispatcherConfig,
        queue: Arc<dyn JobQueue>,
        handler: Arc<dyn JobHandler>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            queue,
            handler,
            notifier: None,
            telemetry: None,
            stats: Arc::new(PoolStats::default()),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Sets the notifier used after successful jobs.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets the telemetry handle failures are reported to.
    pub fn with_telemetry(mut self, telemetry: TelemetryHandle) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Open one delivery stream per worker and start the workers.
    ///
    /// Fails without starting anything if a stream cannot be opened.
    pub async fn start(&self) -> Result<(), DispatcherError> {
        let mut workers = self.workers.lock().await;
        if self.running.load(Ordering::SeqCst) || !workers.is_empty() {
            return Err(DispatcherError::AlreadyStarted);
        }

        let mut streams = Vec::with_capacity(self.config.concurrency);
        for _ in 0..self.config.concurrency {
            let stream = self
                .queue
                .receiver()
                .await
                .map_err(|e| DispatcherError::ConnectionLost(e.to_string()))?;
            streams.push(stream);
        }

        self.running.store(true, Ordering::SeqCst);
        for (id, stream) in streams.into_iter().enumerate() {
            let worker = Worker {
                id,
                disposition: self.config.failure_disposition,
                handler: Arc::clone(&self.handler),
                notifier: self.notifier.clone(),
                telemetry: self.telemetry.clone(),
                stats: Arc::clone(&self.stats),
            };
            let shutdown_rx = self.shutdown_tx.subscribe();
            workers.push((id, tokio::spawn(worker.run(stream, shutdown_rx))));
        }

        info!(
            workers = self.config.concurrency,
            queue = self.queue.name(),
            "Worker pool started"
        );
        Ok(())
    }

    /// Stop pulling new deliveries. Jobs already in progress run to completion.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Worker pool shutting down");
        }
        let _ = self.shutdown_tx.send(());
    }

    /// Wait for all workers to stop.
    ///
    /// If any worker loses its delivery stream, the remaining workers are told
    /// to stop, allowed to finish their current job, and the first error is
    /// returned.
    pub async fn wait(&self) -> Result<(), DispatcherError> {
        let handles: Vec<(usize, WorkerTask)> = std::mem::take(&mut *self.workers.lock().await);

        let mut pending: FuturesUnordered<_> = handles
            .into_iter()
            .map(|(id, handle)| async move { (id, handle.await) })
            .collect();

        let mut first_error = None;
        while let Some((id, joined)) = pending.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(DispatcherError::WorkerPanicked {
                    worker: id,
                    reason: e.to_string(),
                }),
            };

            if let Err(e) = result {
                error!(worker = id, error = %e, "Worker stopped with error");
                if first_error.is_none() {
                    self.shutdown();
                    first_error = Some(e);
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn status(&self) -> PoolStatus {
        self.stats
            .to_status(self.running.load(Ordering::Relaxed), self.config.concurrency)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// State owned by one worker task.
struct Worker {
    id: usize,
    disposition: FailureDisposition,
    handler: Arc<dyn JobHandler>,
    notifier: Option<Arc<dyn Notifier>>,
    telemetry: Option<TelemetryHandle>,
    stats: Arc<PoolStats>,
}

impl Worker {
    async fn run(
        self,
        mut stream: Box<dyn DeliveryStream>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), DispatcherError> {
        debug!(worker = self.id, "Worker started");

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    debug!(worker = self.id, "Worker received shutdown signal");
                    break;
                }
                next = stream.next() => next,
            };

            match next {
                Ok(Some(delivery)) => self.process(delivery).await,
                Ok(None) => {
                    return Err(DispatcherError::ConnectionLost(
                        "delivery stream closed".to_string(),
                    ))
                }
                Err(e) => return Err(DispatcherError::ConnectionLost(e.to_string())),
            }
        }

        debug!(worker = self.id, "Worker stopped");
        Ok(())
    }

    async fn process(&self, delivery: Delivery) {
        self.stats.busy.fetch_add(1, Ordering::SeqCst);

        match JobEnvelope::decode(delivery.payload()) {
            Ok(envelope) => self.process_job(&delivery, &envelope).await,
            Err(e) => self.reject_poison(&delivery, JobError::Decode(e)).await,
        }

        self.stats.busy.fetch_sub(1, Ordering::SeqCst);
    }

    async fn process_job(&self, delivery: &Delivery, envelope: &JobEnvelope) {
        let started = Instant::now();
        info!(
            worker = self.id,
            file_id = %envelope.file_id,
            user_id = %envelope.user_id,
            file_name = %envelope.file_name,
            file_size = envelope.file_size,
            file_duration = envelope.file_duration,
            delivery_count = delivery.delivery_count(),
            "Job started"
        );

        match self.handler.handle(envelope).await {
            Ok(outcome) => {
                self.stats.processed.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = delivery.ack().await {
                    error!(file_id = %envelope.file_id, error = %e, "Failed to acknowledge job");
                }

                let elapsed = started.elapsed();
                metrics::JOBS_TOTAL.with_label_values(&["success", "none"]).inc();
                metrics::JOB_DURATION
                    .with_label_values(&["success"])
                    .observe(elapsed.as_secs_f64());

                self.spawn_notification(envelope, &outcome);

                info!(
                    worker = self.id,
                    file_id = %envelope.file_id,
                    user_id = %envelope.user_id,
                    artifact_location = %outcome.artifact_location,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Job completed"
                );
            }
            Err(e) => {
                let elapsed = started.elapsed();
                error!(
                    worker = self.id,
                    file_id = %envelope.file_id,
                    user_id = %envelope.user_id,
                    file_name = %envelope.file_name,
                    error_kind = e.kind(),
                    error = %e,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Job failed"
                );

                if let Some(telemetry) = &self.telemetry {
                    telemetry
                        .report(FailureReport::for_job(
                            envelope,
                            ACTION_SRT_PROCESSING,
                            e.kind(),
                            e.to_string(),
                        ))
                        .await;
                }

                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                let settled = match self.disposition {
                    FailureDisposition::Reject => delivery.reject().await,
                    FailureDisposition::Requeue => delivery.nak().await,
                };
                if let Err(settle_err) = settled {
                    error!(file_id = %envelope.file_id, error = %settle_err, "Failed to settle failed job");
                }

                metrics::JOBS_TOTAL
                    .with_label_values(&["failure", e.kind()])
                    .inc();
                metrics::JOB_DURATION
                    .with_label_values(&["failure"])
                    .observe(elapsed.as_secs_f64());
            }
        }
    }

    async fn reject_poison(&self, delivery: &Delivery, error: JobError) {
        warn!(
            worker = self.id,
            payload_len = delivery.payload().len(),
            delivery_count = delivery.delivery_count(),
            error = %error,
            "Rejecting undecodable message"
        );

        if let Some(telemetry) = &self.telemetry {
            telemetry
                .report(FailureReport::for_poison_message(error.to_string()))
                .await;
        }

        self.stats.rejected.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = delivery.reject().await {
            error!(error = %e, "Failed to reject undecodable message");
        }

        metrics::POISON_MESSAGES.inc();
    }

    fn spawn_notification(&self, envelope: &JobEnvelope, outcome: &JobOutcome) {
        let Some(notifier) = self.notifier.clone() else {
            debug!(file_id = %envelope.file_id, "No notifier configured");
            return;
        };

        let address = envelope.email.clone();
        let file_id = envelope.file_id.clone();
        let artifact_location = outcome.artifact_location.clone();

        tokio::spawn(async move {
            match notifier
                .send_conversion_complete(&address, &artifact_location)
                .await
            {
                Ok(()) => {
                    metrics::NOTIFICATIONS_TOTAL.with_label_values(&["sent"]).inc();
                    info!(email = %address, file_id = %file_id, artifact_location = %artifact_location, "Notification sent");
                }
                Err(e) => {
                    metrics::NOTIFICATIONS_TOTAL.with_label_values(&["failed"]).inc();
                    error!(email = %address, file_id = %file_id, error_kind = e.kind(), error = %e, "Notification failed");
                }
            }
        });
    }
}

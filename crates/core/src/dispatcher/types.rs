//! Worker pool types.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Snapshot of the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Whether the pool is accepting new deliveries.
    pub running: bool,
    /// Configured number of workers.
    pub workers: usize,
    /// Workers currently processing a job.
    pub busy: u64,
    /// Jobs completed successfully since startup.
    pub total_processed: u64,
    /// Jobs whose handler failed since startup.
    pub total_failed: u64,
    /// Undecodable messages rejected since startup.
    pub total_rejected: u64,
}

/// Counters shared by all workers.
#[derive(Debug, Default)]
pub(crate) struct PoolStats {
    pub busy: AtomicU64,
    pub processed: AtomicU64,
    pub failed: AtomicU64,
    pub rejected: AtomicU64,
}

impl PoolStats {
    pub fn to_status(&self, running: bool, workers: usize) -> PoolStatus {
        PoolStatus {
            running,
            workers,
            busy: self.busy.load(Ordering::Relaxed),
            total_processed: self.processed.load(Ordering::Relaxed),
            total_failed: self.failed.load(Ordering::Relaxed),
            total_rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

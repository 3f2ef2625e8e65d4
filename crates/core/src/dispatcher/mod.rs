//! Worker pool dispatcher.
//!
//! Pulls envelopes off the queue with a fixed number of workers and hands
//! each one to a [`JobHandler`].

mod config;
mod error;
mod pool;
mod traits;
mod types;

pub use config::{DispatcherConfig, FailureDisposition};
pub use error::DispatcherError;
pub use pool::WorkerPool;
pub use traits::{JobHandler, JobOutcome};
pub use types::PoolStatus;

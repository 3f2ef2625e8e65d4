//! Conversion orchestration.
//!
//! [`ConversionOrchestrator`] drives one conversion through storage, compute
//! and history. [`SubtitleJobHandler`] wraps it with the usage ledger and is
//! what the worker pool calls for each job.

mod config;
mod conversion;
mod error;
mod handler;
mod types;

pub use config::OrchestratorConfig;
pub use conversion::ConversionOrchestrator;
pub use error::{ConversionError, JobError};
pub use handler::SubtitleJobHandler;
pub use types::{ConversionRequest, ConversionResult, ConversionStatus, PayloadSource};

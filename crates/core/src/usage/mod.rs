//! Usage ledger: per-user monthly quotas and processed-duration accounting.
//!
//! Durations are in seconds throughout.

mod error;
mod ledger;
mod sqlite;
mod store;
mod types;

pub use error::UsageError;
pub use ledger::UsageLedger;
pub use sqlite::SqliteUsageStore;
pub use store::UsageStore;
pub use types::{Plan, PlanLimits, UsageRecord, UsageSummary, UserAccount};

//! Failure reporting.
//!
//! Failures are sent through a [`TelemetryHandle`] to a background
//! [`TelemetryWriter`], which logs them and keeps a queryable record for
//! support.

mod events;
mod handle;
mod sqlite;
mod store;
mod writer;

pub use events::*;
pub use handle::*;
pub use sqlite::*;
pub use store::*;
pub use writer::*;

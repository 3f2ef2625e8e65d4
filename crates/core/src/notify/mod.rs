//! Completion notifications.

mod config;
mod email;
mod error;
mod log;
mod traits;

pub use config::NotifierConfig;
pub use email::HttpEmailNotifier;
pub use error::NotifyError;
pub use log::LogNotifier;
pub use traits::Notifier;

//! Notifier that only logs.

use async_trait::async_trait;
use tracing::info;

use super::{Notifier, NotifyError};

/// Used when no email API is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send_conversion_complete(
        &self,
        address: &str,
        artifact_location: &str,
    ) -> Result<(), NotifyError> {
        info!(address, artifact_location, "Subtitle ready (email delivery not configured)");
        Ok(())
    }
}

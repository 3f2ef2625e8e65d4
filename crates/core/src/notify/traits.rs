//! Trait definitions for notifications.

use async_trait::async_trait;

use super::NotifyError;

/// Tells a user their subtitle file is ready.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the name of this notifier implementation.
    fn name(&self) -> &str;

    async fn send_conversion_complete(
        &self,
        address: &str,
        artifact_location: &str,
    ) -> Result<(), NotifyError>;
}

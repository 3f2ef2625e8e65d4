//! Trait definitions for the compute module.

use async_trait::async_trait;

use super::{ComputeError, ComputeRequest, ComputeResponse};

/// The external function that turns staged media into subtitles.
#[async_trait]
pub trait ComputeService: Send + Sync {
    /// Returns the name of this service implementation.
    fn name(&self) -> &str;

    /// Invoke `function_name` and wait for its response.
    ///
    /// A function-level failure may come back either as `Err` or as a
    /// response with a non-success `status_code`; callers check both.
    async fn invoke(
        &self,
        function_name: &str,
        request: &ComputeRequest,
    ) -> Result<ComputeResponse, ComputeError>;
}

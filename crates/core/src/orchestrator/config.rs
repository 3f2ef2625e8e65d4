//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the conversion orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Delete a staged input when the compute call fails.
    /// Inputs are always kept after a successful conversion.
    #[serde(default = "default_cleanup")]
    pub cleanup_staged_on_failure: bool,
}

fn default_cleanup() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cleanup_staged_on_failure: default_cleanup(),
        }
    }
}

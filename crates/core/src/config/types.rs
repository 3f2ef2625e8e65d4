use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::compute::ComputeConfig;
use crate::dispatcher::DispatcherConfig;
use crate::notify::NotifierConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::queue::QueueConfig;
use crate::storage::StorageConfig;
use crate::usage::PlanLimits;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub compute: ComputeConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub workers: DispatcherConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub notifier: Option<NotifierConfig>,
    #[serde(default)]
    pub plans: PlanLimits,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Operational HTTP server configuration (health, status, metrics)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("autosrt.db")
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_filter() -> String {
    "info,tower_http=debug".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub workers: DispatcherConfig,
    pub storage: StorageConfig,
    pub orchestrator: OrchestratorConfig,
    pub compute: SanitizedComputeConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifier: Option<SanitizedNotifierConfig>,
    pub plans: PlanLimits,
}

/// Compute config with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedComputeConfig {
    pub endpoint: String,
    pub function_name: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

/// Notifier config with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNotifierConfig {
    pub api_url: String,
    pub from_address: String,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            queue: config.queue.clone(),
            workers: config.workers.clone(),
            storage: config.storage.clone(),
            orchestrator: config.orchestrator.clone(),
            compute: SanitizedComputeConfig {
                endpoint: config.compute.endpoint.clone(),
                function_name: config.compute.function_name.clone(),
                api_key_configured: config
                    .compute
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
                timeout_secs: config.compute.timeout_secs,
            },
            notifier: config.notifier.as_ref().map(|n| SanitizedNotifierConfig {
                api_url: n.api_url.clone(),
                from_address: n.from_address.clone(),
                api_key_configured: !n.api_key.is_empty(),
            }),
            plans: config.plans.clone(),
        }
    }
}

//! HTTP client for a function invocation API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{ComputeConfig, ComputeError, ComputeRequest, ComputeResponse, ComputeService};

/// Invokes functions with `POST {endpoint}/functions/{name}/invocations`.
pub struct HttpComputeClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

/// Body returned by the invocation API. `status_code` is the function's own
/// status and falls back to the HTTP status when absent.
#[derive(Debug, Deserialize)]
struct InvocationBody {
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    artifact_location: Option<String>,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpComputeClient {
    pub fn new(config: &ComputeConfig) -> Result<Self, ComputeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ComputeError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            timeout_secs: config.timeout_secs,
        })
    }

    fn invocation_url(&self, function_name: &str) -> String {
        format!("{}/functions/{}/invocations", self.endpoint, function_name)
    }
}

#[async_trait]
impl ComputeService for HttpComputeClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn invoke(
        &self,
        function_name: &str,
        request: &ComputeRequest,
    ) -> Result<ComputeResponse, ComputeError> {
        let url = self.invocation_url(function_name);
        debug!(function = function_name, location = %request.location, "Invoking compute function");

        let mut builder = self.client.post(&url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ComputeError::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                ComputeError::Request(e.to_string())
            }
        })?;

        let http_status = response.status();
        if !http_status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ComputeError::Status {
                status_code: http_status.as_u16(),
                message,
            });
        }

        let body: InvocationBody = response
            .json()
            .await
            .map_err(|e| ComputeError::InvalidResponse(e.to_string()))?;

        Ok(ComputeResponse {
            status_code: body.status_code.unwrap_or_else(|| http_status.as_u16()),
            artifact_location: body.artifact_location,
            subtitle: body.subtitle,
            message: body.message,
        })
    }
}

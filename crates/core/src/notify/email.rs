//! Email notifier backed by an HTTP email API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{Notifier, NotifierConfig, NotifyError};

const SUBJECT: &str = "Your subtitles are ready";

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
    text: String,
}

/// Sends completion emails through a JSON email API with bearer auth.
pub struct HttpEmailNotifier {
    client: Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl HttpEmailNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        })
    }
}

fn render_body(artifact_location: &str) -> (String, String) {
    let html = format!(
        "<p>Your subtitle file has been generated.</p>\
         <p><a href=\"{0}\">Download your SRT file</a></p>\
         <p>If the link does not work, copy this address into your browser:<br>{0}</p>",
        artifact_location
    );
    let text = format!(
        "Your subtitle file has been generated.\n\nDownload it here: {}\n",
        artifact_location
    );
    (html, text)
}

#[async_trait]
impl Notifier for HttpEmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn send_conversion_complete(
        &self,
        address: &str,
        artifact_location: &str,
    ) -> Result<(), NotifyError> {
        let (html, text) = render_body(artifact_location);
        let request = EmailRequest {
            from: &self.from_address,
            to: [address],
            subject: SUBJECT,
            html,
            text,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status_code: status.as_u16(),
                message,
            });
        }

        debug!(address, "Completion email accepted");
        Ok(())
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use super::MessagingProvider;
use crate::errors::SendError;
use crate::models::{Credentials, LogContext};
use crate::services::log_sink::LogSink;
use crate::services::settings::SettingsStore;

#[derive(Debug, Serialize)]
struct OutboundText<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

impl<'a> OutboundText<'a> {
    fn new(to: &'a str, body: &'a str) -> Self {
        Self {
            messaging_product: "whatsapp",
            to,
            kind: "text",
            text: TextBody { body },
        }
    }
}

/// Sends text messages through the WhatsApp Cloud API
/// (`POST {api_base}/{phone_number_id}/messages`).
pub struct CloudApiProvider {
    settings: Arc<dyn SettingsStore>,
    log: Arc<dyn LogSink>,
    api_base: String,
    client: reqwest::Client,
}

impl CloudApiProvider {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        log: Arc<dyn LogSink>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            settings,
            log,
            api_base: api_base.into(),
            client,
        })
    }

    async fn deliver(&self, creds: &Credentials, to: &str, body: &str) -> Result<(), SendError> {
        if !creds.can_send() {
            return Err(SendError::ConfigurationMissing);
        }

        let url = format!("{}/{}/messages", self.api_base, creds.phone_number_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&creds.access_token)
            .json(&OutboundText::new(to, body))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        self.log
            .append(&format!("send status {status}"), Some(LogContext::Text(body.clone())));

        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(SendError::UpstreamRejected { status, body })
        }
    }
}

#[async_trait]
impl MessagingProvider for CloudApiProvider {
    async fn send_message(&self, to: &str, body: &str) -> bool {
        let creds = self.settings.credentials();

        match self.deliver(&creds, to, body).await {
            Ok(()) => {
                tracing::info!(to = %to, "WhatsApp message sent");
                true
            }
            Err(SendError::ConfigurationMissing) => {
                self.log.append("send aborted: missing credentials", None);
                tracing::warn!("send aborted: access token or phone number id not configured");
                false
            }
            Err(SendError::Transport(e)) => {
                self.log.append("send error", Some(LogContext::Text(e.to_string())));
                tracing::error!(error = %e, to = %to, "failed to reach WhatsApp Cloud API");
                false
            }
            Err(SendError::UpstreamRejected { status, .. }) => {
                tracing::warn!(status, to = %to, "WhatsApp Cloud API rejected message");
                false
            }
        }
    }
}

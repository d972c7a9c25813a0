// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SMS gateway integration (Africa's Talking messaging API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use super::Notifier;

const PRODUCTION_BASE_URL: &str = "https://api.africastalking.com";
const SANDBOX_BASE_URL: &str = "https://api.sandbox.africastalking.com";
const MESSAGING_PATH: &str = "/version1/messaging";
const SANDBOX_ENVIRONMENT: &str = "sandbox";
/// Sender id the sandbox simulator expects.
const SANDBOX_SENDER_ID: &str = "AFRICASTKNG";
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("SMS gateway credentials missing")]
    NotConfigured,

    #[error("SMS request failed: {0}")]
    Request(String),

    #[error("SMS response was invalid: {0}")]
    InvalidResponse(String),
}

/// Gateway credentials and environment.
#[derive(Debug, Clone, Default)]
pub struct SmsSettings {
    pub username: String,
    pub api_key: String,
    /// `sandbox` selects the sandbox host and sender id; anything else is production.
    pub environment: String,
    /// Overrides the host chosen from `environment`.
    pub base_url: Option<String>,
}

impl SmsSettings {
    pub fn is_sandbox(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case(SANDBOX_ENVIRONMENT)
    }

    /// Sender id: empty in production, the simulator id in sandbox.
    pub fn sender_id(&self) -> &'static str {
        if self.is_sandbox() {
            SANDBOX_SENDER_ID
        } else {
            ""
        }
    }
}

/// Per-recipient outcome reported by the gateway.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipientStatus {
    pub number: String,
    pub status: String,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub cost: Option<String>,
}

impl RecipientStatus {
    /// Processed, sent or queued.
    pub fn is_accepted(&self) -> bool {
        (100..=102).contains(&self.status_code)
    }
}

/// Parsed gateway response.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SendReport {
    #[serde(rename = "Message", default)]
    pub summary: String,
    #[serde(rename = "Recipients", default)]
    pub recipients: Vec<RecipientStatus>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(rename = "SMSMessageData")]
    data: SendReport,
}

/// HTTP client for the messaging API.
#[derive(Debug, Clone)]
pub struct SmsClient {
    base_url: String,
    username: String,
    api_key: String,
    http: Client,
}

impl SmsClient {
    pub fn new(settings: &SmsSettings) -> Result<Self, SmsError> {
        let base_url = match &settings.base_url {
            Some(url) => url.clone(),
            None if settings.is_sandbox() => SANDBOX_BASE_URL.to_string(),
            None => PRODUCTION_BASE_URL.to_string(),
        };

        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| SmsError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            username: settings.username.trim().to_string(),
            api_key: settings.api_key.trim().to_string(),
            http,
        })
    }

    /// Whether credentials were supplied.
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.api_key.is_empty()
    }

    /// Send `message` to every recipient in one request.
    ///
    /// `sender_id` is omitted from the request when empty.
    pub async fn send(
        &self,
        recipients: &[String],
        message: &str,
        sender_id: &str,
    ) -> Result<SendReport, SmsError> {
        if !self.is_configured() {
            return Err(SmsError::NotConfigured);
        }

        let to = recipients.join(",");
        let mut form = vec![
            ("username", self.username.as_str()),
            ("to", to.as_str()),
            ("message", message),
        ];
        if !sender_id.is_empty() {
            form.push(("from", sender_id));
        }

        let response = self
            .http
            .post(format!(
                "{}{MESSAGING_PATH}",
                self.base_url.trim_end_matches('/')
            ))
            .header("apiKey", &self.api_key)
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| SmsError::Request(format!("POST {MESSAGING_PATH} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::Request(format!(
                "POST {MESSAGING_PATH} returned {status}: {body}"
            )));
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| SmsError::InvalidResponse(e.to_string()))?;

        Ok(parsed.data)
    }
}

/// [`Notifier`] that delivers by SMS and logs the outcome.
pub struct SmsNotifier {
    client: SmsClient,
    sender_id: String,
}

impl SmsNotifier {
    pub fn new(client: SmsClient, sender_id: impl Into<String>) -> Self {
        Self {
            client,
            sender_id: sender_id.into(),
        }
    }

    pub fn from_settings(settings: &SmsSettings) -> Result<Self, SmsError> {
        Ok(Self::new(SmsClient::new(settings)?, settings.sender_id()))
    }

    /// Whether sends will reach the gateway rather than being skipped.
    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    async fn send(&self, recipient: &str, message: &str) {
        if !self.client.is_configured() {
            info!("SMS gateway not configured, skipping send");
            return;
        }

        let recipients = [recipient.to_string()];
        match self.client.send(&recipients, message, &self.sender_id).await {
            Ok(report) => {
                for status in report.recipients.iter().filter(|s| !s.is_accepted()) {
                    warn!(
                        recipient = %status.number,
                        status = %status.status,
                        status_code = status.status_code,
                        "SMS rejected by gateway"
                    );
                }
                info!(recipient, summary = %report.summary, "SMS sent");
            }
            Err(e) => warn!(recipient, error = %e, "Failed to send SMS"),
        }
    }
}

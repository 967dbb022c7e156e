//! HTTP mail relay notifier.
//!
//! Production delivery goes through an HTTP mail gateway: one POST per
//! message with the sender, recipient, subject, and body. The gateway owns
//! SMTP; this process never speaks it directly.

use super::{DeliveryError, Notification, Notifier};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Configuration for the HTTP mail relay.
#[derive(Debug, Clone)]
pub struct MailRelayConfig {
    /// Relay endpoint receiving message POSTs.
    pub relay_url: String,
    /// Sender address stamped on every message.
    pub from_address: String,
    /// Optional bearer token for the relay.
    pub api_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for MailRelayConfig {
    fn default() -> Self {
        Self {
            relay_url: "http://localhost:8025/messages".to_string(),
            from_address: "watchdesk@localhost".to_string(),
            api_token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// [`Notifier`] implementation backed by an HTTP mail gateway.
pub struct MailRelayNotifier {
    client: reqwest::Client,
    config: MailRelayConfig,
}

#[derive(Serialize)]
struct OutboundMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

impl MailRelayNotifier {
    /// Creates a notifier for the given relay configuration.
    pub fn new(config: MailRelayConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeliveryError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let message = OutboundMessage {
            from: &self.config.from_address,
            to: &notification.recipient,
            subject: &notification.subject,
            body: &notification.body,
        };

        let mut request = self.client.post(&self.config.relay_url).json(&message);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        response
            .error_for_status()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        Ok(())
    }
}

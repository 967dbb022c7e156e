//! Notification dispatch for Watchdesk.
//!
//! Alerting is decoupled from the request path: components hand
//! [`Notification`]s to the [`NotificationDispatcher`], which queues them on
//! a process-wide FIFO and delivers them from a single background consumer
//! through the [`Notifier`] capability. Delivery is fire-and-forget:
//! failures are logged and discarded, and no operation ever fails because a
//! notification could not be sent.

mod dispatcher;
mod mailer;
mod mock;

pub use dispatcher::NotificationDispatcher;
pub use mailer::{MailRelayConfig, MailRelayNotifier};
pub use mock::MockNotifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A queued outbound message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Destination address.
    pub recipient: String,
}

impl Notification {
    /// Creates a new notification.
    pub fn new(subject: impl Into<String>, body: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            recipient: recipient.into(),
        }
    }
}

/// Errors raised by a [`Notifier`] transport.
///
/// These never cross the dispatcher boundary: the consumer logs them and
/// moves on.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The transport rejected or failed to carry the message.
    #[error("Delivery failed: {0}")]
    Transport(String),

    /// The notifier is misconfigured (bad relay URL, missing sender).
    #[error("Notifier configuration error: {0}")]
    Configuration(String),
}

/// Opaque delivery capability.
///
/// The dispatcher does not know or care how messages leave the process;
/// production wires an HTTP mail relay, tests wire a recording mock.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Attempts to deliver one message.
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Notification routing policy.
///
/// Carries the fallback recipient used when no analyst is registered for a
/// level, and the escalation tiers swept on every ticket event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyPolicy {
    /// Address used when a level has no registered analyst, and for
    /// correlation and high-severity alerts.
    pub default_recipient: String,
    /// Escalation levels swept by the ticket fan-out, in order.
    pub escalation_levels: Vec<String>,
}

impl Default for NotifyPolicy {
    fn default() -> Self {
        Self {
            default_recipient: "soc@watchdesk.invalid".to_string(),
            escalation_levels: ["L1", "L2", "L3", "L4"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

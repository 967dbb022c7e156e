//! Environment-driven configuration for the API binary.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use wd_core::{MailRelayConfig, NotifyPolicy};

/// Configuration for the Watchdesk API process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Store URL (`sqlite:...`).
    pub database_url: String,
    /// Listen address.
    pub bind_address: SocketAddr,
    /// Mail relay settings for the notifier.
    pub mail: MailRelayConfig,
    /// Notification routing policy.
    pub policy: NotifyPolicy,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    /// Loads configuration from `WATCHDESK_*` environment variables,
    /// falling back to development defaults.
    pub fn from_env() -> Result<Self> {
        let bind_address = env_or("WATCHDESK_BIND_ADDR", "0.0.0.0:8080")
            .parse()
            .context("invalid WATCHDESK_BIND_ADDR")?;

        let defaults = MailRelayConfig::default();
        let mail = MailRelayConfig {
            relay_url: env_or("WATCHDESK_MAIL_RELAY_URL", &defaults.relay_url),
            from_address: env_or("WATCHDESK_MAIL_FROM", &defaults.from_address),
            api_token: std::env::var("WATCHDESK_MAIL_TOKEN").ok(),
            timeout: Duration::from_secs(10),
        };

        let policy_defaults = NotifyPolicy::default();
        let escalation_levels = match std::env::var("WATCHDESK_ESCALATION_LEVELS") {
            Ok(levels) => levels
                .split(',')
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
            Err(_) => policy_defaults.escalation_levels,
        };
        let policy = NotifyPolicy {
            default_recipient: env_or(
                "WATCHDESK_DEFAULT_RECIPIENT",
                &policy_defaults.default_recipient,
            ),
            escalation_levels,
        };

        Ok(Self {
            database_url: env_or("WATCHDESK_DATABASE_URL", "sqlite:watchdesk.db"),
            bind_address,
            mail,
            policy,
        })
    }
}

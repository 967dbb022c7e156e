//! Watchdesk API binary.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wd_api::{ApiServer, ApiServerConfig, AppConfig, AppState};
use wd_core::db::{create_pool, provision_schema};
use wd_core::MailRelayNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    info!(database_url = %config.database_url, "Starting Watchdesk API");

    let pool = create_pool(&config.database_url)
        .await
        .context("failed to open store")?;
    provision_schema(&pool)
        .await
        .context("failed to provision schema")?;

    let notifier =
        Arc::new(MailRelayNotifier::new(config.mail.clone()).context("invalid mail relay")?);
    let state = AppState::new(&pool, notifier, config.policy.clone());

    // Single consumer for the process lifetime; messages queued before this
    // point are delivered once it starts.
    let _consumer = state.dispatcher.start().await;

    let server = ApiServer::new(
        state,
        ApiServerConfig {
            bind_address: config.bind_address,
        },
    );
    server.run().await.context("server error")?;

    Ok(())
}

//! API server implementation.

use axum::{routing::get, Json, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;

#[allow(unused_imports)]
use crate::dto::*;
use crate::error::ErrorResponse;
use crate::routes;
use crate::state::AppState;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind to.
    pub bind_address: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::logs::ingest_event,
        crate::routes::logs::search_logs,
        crate::routes::rules::create_rule,
        crate::routes::alerts::list_alerts,
        crate::routes::tickets::create_ticket,
        crate::routes::tickets::assign_ticket,
        crate::routes::tickets::close_ticket,
        crate::routes::tickets::reopen_ticket,
        crate::routes::tickets::ticket_history,
        crate::routes::tickets::email_ticket_to_client,
        crate::routes::tickets::search_tickets,
        crate::routes::analysts::list_analysts,
        crate::routes::analysts::list_analysts_by_level,
        crate::routes::analysts::add_analyst,
        crate::routes::analysts::update_analyst,
        crate::routes::analysts::delete_analyst,
    ),
    components(
        schemas(
            HealthResponse,
            IngestResponse,
            LogRecordResponse,
            CreateRuleRequest,
            RuleResponse,
            AlertResponse,
            CreateTicketRequest,
            CreateTicketResponse,
            TicketResponse,
            AssignTicketRequest,
            CloseTicketRequest,
            ReopenTicketRequest,
            HistoryEntryResponse,
            AnalystRequest,
            AnalystResponse,
            MessageResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Logs", description = "Event ingestion and log search"),
        (name = "Correlation", description = "Correlation rules and alerts"),
        (name = "Tickets", description = "Ticket lifecycle"),
        (name = "Analysts", description = "Analyst directory"),
    ),
    info(
        title = "Watchdesk API",
        version = "0.1.0",
        description = "SOC backend for event correlation and remediation ticketing",
        license(name = "MIT"),
    )
)]
pub struct ApiDoc;

/// Builds the application router with middleware applied.
pub fn build_router(state: AppState) -> Router {
    routes::api_router()
        .route("/api/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// API server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Creates a new API server.
    pub fn new(state: AppState, config: ApiServerConfig) -> Self {
        Self { config, state }
    }

    /// Runs the server until ctrl-c.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_address).await?;
        info!(address = %self.config.bind_address, "API server listening");

        let app = build_router(self.state);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown handler");
        return;
    }
    info!("Shutdown signal received");
}

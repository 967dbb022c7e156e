//! API route modules.

pub mod alerts;
pub mod analysts;
pub mod health;
pub mod logs;
pub mod rules;
pub mod tickets;

use crate::state::AppState;
use axum::routing::get;
use axum::Router;

/// Assembles the full API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::health_check))
        .nest("/api/logs", logs::routes())
        .nest("/api/correlation-rules", rules::routes())
        .nest("/api/correlated-alerts", alerts::routes())
        .nest("/api/tickets", tickets::routes())
        .nest("/api/analysts", analysts::routes())
}

//! Correlated alert listing endpoints.

use axum::{extract::State, routing::get, Json, Router};

use crate::dto::AlertResponse;
use crate::error::ApiError;
use crate::state::AppState;
use wd_core::SEARCH_RESULT_LIMIT;

/// Creates alert routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_alerts))
}

/// List the most recently emitted correlated alerts.
#[utoipa::path(
    get,
    path = "/api/correlated-alerts",
    responses(
        (status = 200, description = "Most recent alerts first", body = [AlertResponse])
    ),
    tag = "Correlation"
)]
pub async fn list_alerts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AlertResponse>>, ApiError> {
    let alerts = state.alerts.list_recent(SEARCH_RESULT_LIMIT).await?;
    Ok(Json(alerts.into_iter().map(Into::into).collect()))
}

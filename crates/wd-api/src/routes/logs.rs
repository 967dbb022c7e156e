//! Event ingestion and log search endpoints.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::dto::{IngestResponse, LogRecordResponse, SearchQuery};
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;
use wd_core::{EventPayload, SEARCH_RESULT_LIMIT};

/// Creates log routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(ingest_event))
        .route("/search", get(search_logs))
}

/// Ingest one event.
///
/// Stores the event, runs correlation synchronously, and queues any
/// resulting notifications before responding.
#[utoipa::path(
    post,
    path = "/api/logs",
    responses(
        (status = 200, description = "Event stored", body = IngestResponse),
        (status = 400, description = "Missing event id or raw log text", body = ErrorResponse)
    ),
    tag = "Logs"
)]
pub async fn ingest_event(
    State(state): State<AppState>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<IngestResponse>, ApiError> {
    let record = state.ingestor.ingest(payload).await?;

    Ok(Json(IngestResponse {
        message: "Event stored".to_string(),
        id: record.id,
        event_id: record.event_id,
    }))
}

/// Search stored events by event id, rule description, or agent name.
#[utoipa::path(
    get,
    path = "/api/logs/search",
    params(
        ("q" = Option<String>, Query, description = "Search term")
    ),
    responses(
        (status = 200, description = "Matching records, most recent first", body = [LogRecordResponse])
    ),
    tag = "Logs"
)]
pub async fn search_logs(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<LogRecordResponse>>, ApiError> {
    let records = state.logs.search(&query.q, SEARCH_RESULT_LIMIT).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

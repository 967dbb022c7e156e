//! Analyst directory endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::{AnalystRequest, AnalystResponse, MessageResponse};
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

/// Creates analyst routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_analysts).post(add_analyst))
        .route("/:id", put(update_analyst).delete(delete_analyst))
        .route("/by-level/:level", get(list_analysts_by_level))
}

/// List all registered analysts.
#[utoipa::path(
    get,
    path = "/api/analysts",
    responses(
        (status = 200, description = "All analysts ordered by level", body = [AnalystResponse])
    ),
    tag = "Analysts"
)]
pub async fn list_analysts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnalystResponse>>, ApiError> {
    let analysts = state.directory.all().await?;
    Ok(Json(analysts.into_iter().map(Into::into).collect()))
}

/// List the analysts registered for one escalation level.
#[utoipa::path(
    get,
    path = "/api/analysts/by-level/{level}",
    params(("level" = String, Path, description = "Escalation level label")),
    responses(
        (status = 200, description = "Analysts for the level", body = [AnalystResponse])
    ),
    tag = "Analysts"
)]
pub async fn list_analysts_by_level(
    State(state): State<AppState>,
    Path(level): Path<String>,
) -> Result<Json<Vec<AnalystResponse>>, ApiError> {
    let analysts = state.directory.by_level(&level).await?;
    Ok(Json(analysts.into_iter().map(Into::into).collect()))
}

/// Register an analyst address for a level.
#[utoipa::path(
    post,
    path = "/api/analysts",
    request_body = AnalystRequest,
    responses(
        (status = 201, description = "Analyst registered", body = AnalystResponse),
        (status = 400, description = "Missing level or email", body = ErrorResponse)
    ),
    tag = "Analysts"
)]
pub async fn add_analyst(
    State(state): State<AppState>,
    Json(request): Json<AnalystRequest>,
) -> Result<(StatusCode, Json<AnalystResponse>), ApiError> {
    request.validate()?;

    let role = state.directory.add(&request.level, &request.email).await?;
    Ok((StatusCode::CREATED, Json(role.into())))
}

/// Update an analyst row.
#[utoipa::path(
    put,
    path = "/api/analysts/{id}",
    params(("id" = Uuid, Path, description = "Analyst id")),
    request_body = AnalystRequest,
    responses(
        (status = 200, description = "Analyst updated", body = MessageResponse),
        (status = 404, description = "Analyst not found", body = ErrorResponse)
    ),
    tag = "Analysts"
)]
pub async fn update_analyst(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnalystRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;

    state
        .directory
        .update(id, &request.level, &request.email)
        .await?;

    Ok(Json(MessageResponse {
        message: "Analyst updated".to_string(),
    }))
}

/// Delete an analyst row.
#[utoipa::path(
    delete,
    path = "/api/analysts/{id}",
    params(("id" = Uuid, Path, description = "Analyst id")),
    responses(
        (status = 200, description = "Analyst deleted", body = MessageResponse),
        (status = 404, description = "Analyst not found", body = ErrorResponse)
    ),
    tag = "Analysts"
)]
pub async fn delete_analyst(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.directory.remove(id).await?;
    Ok(Json(MessageResponse {
        message: "Analyst deleted".to_string(),
    }))
}

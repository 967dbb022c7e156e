//! Correlation rule management endpoints.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::{CreateRuleRequest, RuleResponse};
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;
use wd_core::CorrelationRule;

/// Creates rule routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(create_rule))
}

/// Add a correlation rule.
#[utoipa::path(
    post,
    path = "/api/correlation-rules",
    request_body = CreateRuleRequest,
    responses(
        (status = 201, description = "Rule created", body = RuleResponse),
        (status = 400, description = "Invalid rule definition", body = ErrorResponse)
    ),
    tag = "Correlation"
)]
pub async fn create_rule(
    State(state): State<AppState>,
    Json(request): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<RuleResponse>), ApiError> {
    request.validate()?;

    let rule = CorrelationRule {
        id: Uuid::new_v4(),
        name: request.name,
        keyword: request.keyword,
        threshold: request.threshold,
        window_secs: request.window_secs,
        severity: request.severity,
        description: request.description,
        created_at: Utc::now(),
    };

    state.rules.insert(&rule).await?;

    Ok((StatusCode::CREATED, Json(rule.into())))
}

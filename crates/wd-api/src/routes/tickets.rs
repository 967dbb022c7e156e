//! Ticket lifecycle endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::{
    AssignTicketRequest, CloseTicketRequest, CreateTicketRequest, CreateTicketResponse,
    HistoryEntryResponse, MessageResponse, ReopenTicketRequest, SearchQuery, TicketResponse,
};
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;
use wd_core::{NewTicket, TicketStatus, SEARCH_RESULT_LIMIT};

/// Creates ticket routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_ticket))
        .route("/search", get(search_tickets))
        .route("/:id/assign", post(assign_ticket))
        .route("/:id/close", post(close_ticket))
        .route("/:id/reopen", post(reopen_ticket))
        .route("/:id/history", get(ticket_history))
        .route("/:id/email-client", post(email_ticket_to_client))
}

fn actor_or_system(actor: Option<String>) -> String {
    actor
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| "system".to_string())
}

/// Create a ticket.
#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = CreateTicketResponse),
        (status = 400, description = "Missing event id or client email", body = ErrorResponse)
    ),
    tag = "Tickets"
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    Json(request): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<CreateTicketResponse>), ApiError> {
    request.validate()?;

    let status = match request.status.as_deref() {
        None => None,
        Some(s) => Some(TicketStatus::from_db_str(s).ok_or_else(|| {
            ApiError::Validation(format!("unknown ticket status '{s}'"))
        })?),
    };

    let ticket = state
        .tickets
        .create(NewTicket {
            event_id: request.event_id.unwrap_or_default(),
            client_email: request.client_email.unwrap_or_default(),
            status,
            severity: request.severity,
            assigned_to: request.assigned_to,
            notes: request.notes,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTicketResponse {
            message: format!("Ticket {} created", ticket.id),
            ticket_id: ticket.id,
        }),
    ))
}

/// Assign a ticket.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/assign",
    params(("id" = Uuid, Path, description = "Ticket id")),
    request_body = AssignTicketRequest,
    responses(
        (status = 200, description = "Ticket assigned", body = TicketResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse)
    ),
    tag = "Tickets"
)]
pub async fn assign_ticket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignTicketRequest>,
) -> Result<Json<TicketResponse>, ApiError> {
    request.validate()?;

    let actor = actor_or_system(request.actor);
    let ticket = state
        .tickets
        .assign(id, &request.assigned_to, &actor)
        .await?;

    Ok(Json(ticket.into()))
}

/// Close a ticket.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/close",
    params(("id" = Uuid, Path, description = "Ticket id")),
    request_body = CloseTicketRequest,
    responses(
        (status = 200, description = "Ticket resolved", body = TicketResponse),
        (status = 400, description = "Ticket already resolved", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse)
    ),
    tag = "Tickets"
)]
pub async fn close_ticket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CloseTicketRequest>,
) -> Result<Json<TicketResponse>, ApiError> {
    let actor = actor_or_system(request.actor);
    let ticket = state
        .tickets
        .close(id, request.notes.as_deref(), &actor)
        .await?;

    Ok(Json(ticket.into()))
}

/// Reopen a resolved ticket.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/reopen",
    params(("id" = Uuid, Path, description = "Ticket id")),
    request_body = ReopenTicketRequest,
    responses(
        (status = 200, description = "Ticket reopened", body = TicketResponse),
        (status = 400, description = "Ticket is not resolved", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse)
    ),
    tag = "Tickets"
)]
pub async fn reopen_ticket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReopenTicketRequest>,
) -> Result<Json<TicketResponse>, ApiError> {
    let actor = actor_or_system(request.actor);
    let ticket = state.tickets.reopen(id, &actor).await?;

    Ok(Json(ticket.into()))
}

/// Get the audit history of a ticket.
#[utoipa::path(
    get,
    path = "/api/tickets/{id}/history",
    params(("id" = Uuid, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "History entries, oldest first", body = [HistoryEntryResponse]),
        (status = 404, description = "Ticket not found", body = ErrorResponse)
    ),
    tag = "Tickets"
)]
pub async fn ticket_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<HistoryEntryResponse>>, ApiError> {
    let history = state.tickets.history(id).await?;
    Ok(Json(history.into_iter().map(Into::into).collect()))
}

/// Re-send the ticket summary to the client and analyst tiers.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/email-client",
    params(("id" = Uuid, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Notifications queued", body = MessageResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse)
    ),
    tag = "Tickets"
)]
pub async fn email_ticket_to_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.tickets.share(id).await?;
    Ok(Json(MessageResponse {
        message: "Ticket shared with client".to_string(),
    }))
}

/// Search tickets by event id, notes, or assignee.
#[utoipa::path(
    get,
    path = "/api/tickets/search",
    params(("q" = Option<String>, Query, description = "Search term")),
    responses(
        (status = 200, description = "Matching tickets, most recently updated first", body = [TicketResponse])
    ),
    tag = "Tickets"
)]
pub async fn search_tickets(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    let tickets = state.tickets.search(&query.q, SEARCH_RESULT_LIMIT).await?;
    Ok(Json(tickets.into_iter().map(Into::into).collect()))
}

//! Data Transfer Objects (DTOs) for API requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;
use wd_core::{
    AnalystRole, CorrelatedAlert, CorrelationRule, LogRecord, SecurityTicket, TicketHistoryEntry,
};

// ============================================================================
// Generic DTOs
// ============================================================================

/// Generic acknowledgement response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Free-text search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search term; an empty term matches everything.
    #[serde(default)]
    pub q: String,
}

// ============================================================================
// Log DTOs
// ============================================================================

/// Response for a stored event.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    pub message: String,
    /// Identifier of the stored record.
    pub id: Uuid,
    /// Source-assigned event id.
    pub event_id: String,
}

/// One log record in search results.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogRecordResponse {
    pub event_id: String,
    pub rule_level: i64,
    pub agent_name: Option<String>,
    pub rule_description: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<LogRecord> for LogRecordResponse {
    fn from(record: LogRecord) -> Self {
        Self {
            event_id: record.event_id,
            rule_level: record.rule_level,
            agent_name: record.agent_name,
            rule_description: record.rule_description,
            timestamp: record.timestamp,
        }
    }
}

// ============================================================================
// Correlation rule DTOs
// ============================================================================

/// Request to create a correlation rule.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRuleRequest {
    /// Rule name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Keyword matched against raw log text.
    #[validate(length(min = 1))]
    pub keyword: String,
    /// Minimum matching events within the window.
    #[validate(range(min = 1))]
    pub threshold: i64,
    /// Window length in seconds.
    #[validate(range(min = 1))]
    pub window_secs: i64,
    /// Severity label for emitted alerts.
    #[validate(length(min = 1))]
    pub severity: String,
    /// Human description included in notifications.
    pub description: Option<String>,
}

/// Response for a correlation rule.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RuleResponse {
    pub id: Uuid,
    pub name: String,
    pub keyword: String,
    pub threshold: i64,
    pub window_secs: i64,
    pub severity: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CorrelationRule> for RuleResponse {
    fn from(rule: CorrelationRule) -> Self {
        Self {
            id: rule.id,
            name: rule.name,
            keyword: rule.keyword,
            threshold: rule.threshold,
            window_secs: rule.window_secs,
            severity: rule.severity,
            description: rule.description,
            created_at: rule.created_at,
        }
    }
}

// ============================================================================
// Correlated alert DTOs
// ============================================================================

/// Response for a correlated alert.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AlertResponse {
    pub id: Uuid,
    pub correlation_type: String,
    pub related_event_ids: Vec<String>,
    pub severity: String,
    pub agent_id: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl From<CorrelatedAlert> for AlertResponse {
    fn from(alert: CorrelatedAlert) -> Self {
        Self {
            id: alert.id,
            correlation_type: alert.correlation_type,
            related_event_ids: alert.related_event_ids,
            severity: alert.severity,
            agent_id: alert.agent_id,
            notes: alert.notes,
            created_at: alert.created_at,
        }
    }
}

// ============================================================================
// Ticket DTOs
// ============================================================================

/// Request to create a ticket.
///
/// The event id and client email are required; they are optional here so
/// their absence surfaces as a validation failure rather than a
/// deserialization rejection.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTicketRequest {
    /// Source event id the ticket is raised for.
    pub event_id: Option<String>,
    /// Client contact address.
    #[validate(email)]
    pub client_email: Option<String>,
    /// Initial status (`new`, `in_progress`, `resolved`); defaults to `new`.
    pub status: Option<String>,
    /// Severity label; defaults to `low`.
    pub severity: Option<String>,
    /// Initial assignee.
    pub assigned_to: Option<String>,
    /// Initial notes.
    pub notes: Option<String>,
}

/// Response for a created ticket.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTicketResponse {
    pub message: String,
    pub ticket_id: Uuid,
}

/// One ticket in search results.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketResponse {
    pub id: Uuid,
    pub event_id: String,
    pub status: String,
    pub severity: String,
    pub assigned_to: Option<String>,
    pub notes: String,
    pub updated_at: DateTime<Utc>,
    pub client_email: String,
}

impl From<SecurityTicket> for TicketResponse {
    fn from(ticket: SecurityTicket) -> Self {
        Self {
            id: ticket.id,
            event_id: ticket.event_id,
            status: ticket.status.as_db_str().to_string(),
            severity: ticket.severity,
            assigned_to: ticket.assigned_to,
            notes: ticket.notes,
            updated_at: ticket.updated_at,
            client_email: ticket.client_email,
        }
    }
}

/// Request to assign a ticket.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignTicketRequest {
    /// New assignee.
    #[validate(length(min = 1))]
    pub assigned_to: String,
    /// Actor recorded in the audit history; defaults to `system`.
    pub actor: Option<String>,
}

/// Request to close a ticket.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CloseTicketRequest {
    /// Closure notes appended to the ticket.
    pub notes: Option<String>,
    /// Actor recorded in the audit history; defaults to `system`.
    pub actor: Option<String>,
}

/// Request to reopen a ticket.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReopenTicketRequest {
    /// Actor recorded in the audit history; defaults to `system`.
    pub actor: Option<String>,
}

/// One audit history entry of a ticket.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntryResponse {
    pub id: Uuid,
    pub field_changed: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}

impl From<TicketHistoryEntry> for HistoryEntryResponse {
    fn from(entry: TicketHistoryEntry) -> Self {
        Self {
            id: entry.id,
            field_changed: entry.field_changed,
            old_value: entry.old_value,
            new_value: entry.new_value,
            changed_by: entry.changed_by,
            changed_at: entry.changed_at,
        }
    }
}

// ============================================================================
// Analyst DTOs
// ============================================================================

/// Request to register or update an analyst.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AnalystRequest {
    /// Escalation level label.
    #[validate(length(min = 1))]
    pub level: String,
    /// Notification address.
    #[validate(email)]
    pub email: String,
}

/// Response for an analyst row.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalystResponse {
    pub id: Uuid,
    pub level: String,
    pub email: String,
}

impl From<AnalystRole> for AnalystResponse {
    fn from(role: AnalystRole) -> Self {
        Self {
            id: role.id,
            level: role.level,
            email: role.email,
        }
    }
}

// ============================================================================
// Health DTOs
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

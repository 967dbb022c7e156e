//! Domain data models for Watchdesk.
//!
//! This module defines the records persisted by the system: ingested log
//! events, operator-authored correlation rules, derived correlated alerts,
//! remediation tickets with their audit history, and analyst roles.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single ingested security event. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Unique identifier for this record.
    pub id: Uuid,
    /// Identifier assigned by the source system (the agent alert id).
    pub event_id: String,
    /// Timestamp of the event as reported by the source.
    pub timestamp: DateTime<Utc>,
    /// Severity level reported by the source rule (0-15 scale).
    pub rule_level: i64,
    /// Human-readable description of the matched source rule.
    pub rule_description: Option<String>,
    /// Identifier of the matched source rule.
    pub rule_id: Option<String>,
    /// MITRE ATT&CK technique ids, comma-joined.
    pub mitre_ids: Option<String>,
    /// MITRE ATT&CK tactic names, comma-joined.
    pub mitre_tactics: Option<String>,
    /// MITRE ATT&CK technique names, comma-joined.
    pub mitre_techniques: Option<String>,
    /// Identifier of the agent that generated the event.
    pub agent_id: Option<String>,
    /// Name of the agent that generated the event.
    pub agent_name: Option<String>,
    /// Name of the manager node the agent reports to.
    pub manager_name: Option<String>,
    /// Raw log text the event was derived from.
    pub full_log: String,
    /// Log source location on the agent (file path, channel).
    pub location: Option<String>,
    /// Command line captured with the event, if any.
    pub command: Option<String>,
    /// Source user of the action.
    pub src_user: Option<String>,
    /// Destination user of the action.
    pub dst_user: Option<String>,
    /// Controlling terminal.
    pub tty: Option<String>,
    /// Working directory at the time of the event.
    pub cwd: Option<String>,
}

/// Normalized event payload accepted by the ingest endpoint.
///
/// Mirrors the agent alert JSON: identifying fields at the top level with
/// nested `rule`, `agent`, `manager`, and `data` blocks. Every field is
/// optional at this layer; the ingestor decides what is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayload {
    /// Source-assigned event id.
    pub id: Option<String>,
    /// Event timestamp; ingest time is used when absent.
    pub timestamp: Option<DateTime<Utc>>,
    /// Matched source rule metadata.
    #[serde(default)]
    pub rule: RuleMeta,
    /// Originating agent metadata.
    #[serde(default)]
    pub agent: AgentMeta,
    /// Manager node metadata.
    #[serde(default)]
    pub manager: ManagerMeta,
    /// Raw log text.
    pub full_log: Option<String>,
    /// Log source location.
    pub location: Option<String>,
    /// Structured command context.
    #[serde(default)]
    pub data: CommandContext,
}

/// Rule metadata block of an event payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleMeta {
    /// Severity level of the matched rule.
    pub level: Option<i64>,
    /// Description of the matched rule.
    pub description: Option<String>,
    /// Identifier of the matched rule.
    pub id: Option<String>,
    /// MITRE ATT&CK mapping.
    #[serde(default)]
    pub mitre: MitreMeta,
}

/// MITRE ATT&CK identifiers attached to a source rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MitreMeta {
    /// Technique ids (e.g. "T1110").
    pub id: Option<String>,
    /// Tactic names.
    pub tactic: Option<String>,
    /// Technique names.
    pub technique: Option<String>,
}

/// Agent metadata block of an event payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMeta {
    /// Agent identifier.
    pub id: Option<String>,
    /// Agent name.
    pub name: Option<String>,
}

/// Manager metadata block of an event payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerMeta {
    /// Manager node name.
    pub name: Option<String>,
}

/// Structured command context captured with an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandContext {
    /// Command line.
    pub command: Option<String>,
    /// Source user.
    #[serde(rename = "srcuser")]
    pub src_user: Option<String>,
    /// Destination user.
    #[serde(rename = "dstuser")]
    pub dst_user: Option<String>,
    /// Controlling terminal.
    pub tty: Option<String>,
    /// Working directory.
    #[serde(rename = "pwd")]
    pub cwd: Option<String>,
}

/// An operator-authored correlation rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationRule {
    /// Unique identifier for this rule.
    pub id: Uuid,
    /// Rule name, used as the correlation type of emitted alerts.
    pub name: String,
    /// Substring matched against the raw log text, case-insensitively.
    pub keyword: String,
    /// Minimum number of matching events within the window. Always >= 1.
    pub threshold: i64,
    /// Correlation window in seconds, measured backward from evaluation.
    /// Always > 0.
    pub window_secs: i64,
    /// Severity label carried onto emitted alerts.
    pub severity: String,
    /// Human description included in alert notifications.
    pub description: Option<String>,
    /// When the rule was created.
    pub created_at: DateTime<Utc>,
}

impl CorrelationRule {
    /// Returns the correlation window as a duration.
    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_secs)
    }

    /// Checks whether this rule's keyword occurs in the given log text.
    pub fn matches(&self, full_log: &str) -> bool {
        full_log
            .to_lowercase()
            .contains(&self.keyword.to_lowercase())
    }
}

/// A composite finding produced when a correlation rule's threshold is met.
/// Append-only; created only by the correlation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelatedAlert {
    /// Unique identifier for this alert.
    pub id: Uuid,
    /// Name of the rule that fired.
    pub correlation_type: String,
    /// Source event ids related to this alert. Never empty.
    pub related_event_ids: Vec<String>,
    /// Severity label inherited from the rule.
    pub severity: String,
    /// Agent the correlated events belong to.
    pub agent_id: Option<String>,
    /// Free-text summary of what fired and why.
    pub notes: String,
    /// When the alert was emitted.
    pub created_at: DateTime<Utc>,
}

/// Lifecycle states of a [`SecurityTicket`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Freshly created, not yet worked.
    New,
    /// Under active investigation.
    InProgress,
    /// Remediation complete.
    Resolved,
}

impl TicketStatus {
    /// Returns the database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
        }
    }

    /// Parses a status from a database string.
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(TicketStatus::New),
            "in_progress" => Some(TicketStatus::InProgress),
            "resolved" => Some(TicketStatus::Resolved),
            _ => None,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// A remediation ticket tracking human response to a detected event.
///
/// All mutation goes through the ticket service; status never changes
/// except via its transition operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityTicket {
    /// Unique identifier for this ticket.
    pub id: Uuid,
    /// Source event id the ticket was raised for.
    pub event_id: String,
    /// Current lifecycle state.
    pub status: TicketStatus,
    /// Severity label.
    pub severity: String,
    /// Analyst the ticket is assigned to, if any.
    pub assigned_to: Option<String>,
    /// Free-text notes. Appended to on closure, never truncated.
    pub notes: String,
    /// Timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
    /// Client contact address notified on ticket events.
    pub client_email: String,
}

impl SecurityTicket {
    /// Renders the summary block included in ticket notifications.
    pub fn summary(&self) -> String {
        format!(
            "Event ID: {}\nStatus: {}\nSeverity: {}\nAssigned to: {}\nNotes: {}",
            self.event_id,
            self.status,
            self.severity,
            self.assigned_to.as_deref().unwrap_or("unassigned"),
            self.notes,
        )
    }
}

/// Append-only audit record of one field change on one ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketHistoryEntry {
    /// Unique identifier for this entry.
    pub id: Uuid,
    /// Ticket the change applies to.
    pub ticket_id: Uuid,
    /// Name of the changed field (`status`, `assigned_to`).
    pub field_changed: String,
    /// Value before the change.
    pub old_value: Option<String>,
    /// Value after the change.
    pub new_value: Option<String>,
    /// Actor that made the change.
    pub changed_by: String,
    /// When the change was made.
    pub changed_at: DateTime<Utc>,
}

impl TicketHistoryEntry {
    /// Creates a history entry for a single field change.
    pub fn new(
        ticket_id: Uuid,
        field_changed: &str,
        old_value: Option<String>,
        new_value: Option<String>,
        changed_by: &str,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            field_changed: field_changed.to_string(),
            old_value,
            new_value,
            changed_by: changed_by.to_string(),
            changed_at,
        }
    }
}

/// Mapping from an escalation level to one notification address.
/// Multiple rows may share a level for fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystRole {
    /// Unique identifier for this row.
    pub id: Uuid,
    /// Escalation level label (e.g. "L1".."L4").
    pub level: String,
    /// Notification address.
    pub email: String,
}

//! Ticket lifecycle state machine.
//!
//! All mutation of a [`SecurityTicket`] goes through [`TicketService`]:
//! transitions are guarded, every mutation writes exactly one
//! [`TicketHistoryEntry`] in the same transaction, and every ticket event
//! fans out notifications to the client and to every analyst tier.

use crate::db::{DbError, TicketRepository};
use crate::directory::AnalystDirectory;
use crate::model::{SecurityTicket, TicketHistoryEntry, TicketStatus};
use crate::notify::{Notification, NotificationDispatcher, NotifyPolicy};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors raised by ticket operations.
#[derive(Error, Debug)]
pub enum TicketError {
    /// Missing or malformed required input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced ticket does not exist.
    #[error("Ticket not found: {0}")]
    NotFound(Uuid),

    /// A lifecycle guard rejected the transition.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] DbError),
}

/// Input for creating a ticket.
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    /// Source event id the ticket is raised for. Required.
    pub event_id: String,
    /// Client contact address. Required.
    pub client_email: String,
    /// Initial status; defaults to [`TicketStatus::New`].
    pub status: Option<TicketStatus>,
    /// Severity label; defaults to `low`.
    pub severity: Option<String>,
    /// Initial assignee.
    pub assigned_to: Option<String>,
    /// Initial notes.
    pub notes: Option<String>,
}

/// The ticket lifecycle state machine.
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    directory: Arc<AnalystDirectory>,
    dispatcher: Arc<NotificationDispatcher>,
    policy: NotifyPolicy,
}

impl TicketService {
    /// Creates a ticket service over the given collaborators.
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        directory: Arc<AnalystDirectory>,
        dispatcher: Arc<NotificationDispatcher>,
        policy: NotifyPolicy,
    ) -> Self {
        Self {
            tickets,
            directory,
            dispatcher,
            policy,
        }
    }

    /// Creates a ticket. Fails with a validation error when the event id or
    /// the client email is absent.
    pub async fn create(&self, new: NewTicket) -> Result<SecurityTicket, TicketError> {
        if new.event_id.trim().is_empty() || new.client_email.trim().is_empty() {
            return Err(TicketError::Validation(
                "event_id and client_email are required".to_string(),
            ));
        }

        let assigned_to = new.assigned_to.filter(|a| !a.trim().is_empty());
        let ticket = SecurityTicket {
            id: Uuid::new_v4(),
            event_id: new.event_id,
            status: new.status.unwrap_or(TicketStatus::New),
            severity: new.severity.unwrap_or_else(|| "low".to_string()),
            assigned_to: assigned_to.clone(),
            notes: new.notes.unwrap_or_default(),
            updated_at: Utc::now(),
            client_email: new.client_email,
        };

        self.tickets.create(&ticket).await?;
        info!(ticket_id = %ticket.id, event_id = %ticket.event_id, "Ticket created");

        self.notify_event(&ticket, "created").await;
        if let Some(assignee) = assigned_to {
            self.notify_assignee(&ticket, &assignee).await;
        }

        Ok(ticket)
    }

    /// Gets a ticket by id.
    pub async fn get(&self, id: Uuid) -> Result<SecurityTicket, TicketError> {
        self.tickets.get(id).await?.ok_or(TicketError::NotFound(id))
    }

    /// Assigns a ticket. Allowed from any state; the status is unchanged.
    /// A previously unassigned ticket additionally notifies the new
    /// assignee directly.
    pub async fn assign(
        &self,
        id: Uuid,
        assignee: &str,
        actor: &str,
    ) -> Result<SecurityTicket, TicketError> {
        if assignee.trim().is_empty() {
            return Err(TicketError::Validation("assignee is required".to_string()));
        }

        let mut ticket = self.get(id).await?;
        let previous = ticket.assigned_to.clone();
        let now = Utc::now();

        ticket.assigned_to = Some(assignee.to_string());
        ticket.updated_at = now;

        let entry = TicketHistoryEntry::new(
            id,
            "assigned_to",
            previous.clone(),
            Some(assignee.to_string()),
            actor,
            now,
        );
        self.tickets.update_with_history(&ticket, &entry).await?;
        info!(ticket_id = %id, assignee, actor, "Ticket assigned");

        self.notify_event(&ticket, "assigned").await;
        if previous.is_none() {
            self.notify_assignee(&ticket, assignee).await;
        }

        Ok(ticket)
    }

    /// Closes a ticket: appends closure notes and resolves it. Fails when
    /// the ticket is already resolved.
    pub async fn close(
        &self,
        id: Uuid,
        notes: Option<&str>,
        actor: &str,
    ) -> Result<SecurityTicket, TicketError> {
        let mut ticket = self.get(id).await?;

        if ticket.status == TicketStatus::Resolved {
            return Err(TicketError::InvalidTransition(
                "ticket is already resolved".to_string(),
            ));
        }

        let previous = ticket.status;
        let now = Utc::now();

        ticket.notes = format!(
            "{}\n\n--- CLOSURE NOTES ({}) ---\n{}",
            ticket.notes,
            now.to_rfc3339(),
            notes.unwrap_or("No notes"),
        );
        ticket.status = TicketStatus::Resolved;
        ticket.updated_at = now;

        let entry = TicketHistoryEntry::new(
            id,
            "status",
            Some(previous.as_db_str().to_string()),
            Some(TicketStatus::Resolved.as_db_str().to_string()),
            actor,
            now,
        );
        self.tickets.update_with_history(&ticket, &entry).await?;
        info!(ticket_id = %id, actor, "Ticket closed");

        self.notify_event(&ticket, "closed").await;
        Ok(ticket)
    }

    /// Reopens a resolved ticket into `in_progress`. Fails unless the
    /// current status is exactly resolved.
    pub async fn reopen(&self, id: Uuid, actor: &str) -> Result<SecurityTicket, TicketError> {
        let mut ticket = self.get(id).await?;

        if ticket.status != TicketStatus::Resolved {
            return Err(TicketError::InvalidTransition(
                "only resolved tickets can be reopened".to_string(),
            ));
        }

        let now = Utc::now();
        ticket.status = TicketStatus::InProgress;
        ticket.updated_at = now;

        let entry = TicketHistoryEntry::new(
            id,
            "status",
            Some(TicketStatus::Resolved.as_db_str().to_string()),
            Some(TicketStatus::InProgress.as_db_str().to_string()),
            actor,
            now,
        );
        self.tickets.update_with_history(&ticket, &entry).await?;
        info!(ticket_id = %id, actor, "Ticket reopened");

        self.notify_event(&ticket, "reopened").await;
        Ok(ticket)
    }

    /// Re-sends the ticket summary to the client and the analyst tiers
    /// without mutating the ticket.
    pub async fn share(&self, id: Uuid) -> Result<(), TicketError> {
        let ticket = self.get(id).await?;
        self.notify_event(&ticket, "shared").await;
        Ok(())
    }

    /// Returns the audit history of a ticket, oldest first.
    pub async fn history(&self, id: Uuid) -> Result<Vec<TicketHistoryEntry>, TicketError> {
        // Distinguish an absent ticket from one with an empty history.
        self.get(id).await?;
        Ok(self.tickets.history(id).await?)
    }

    /// Searches tickets by event id, notes, or assignee.
    pub async fn search(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SecurityTicket>, TicketError> {
        Ok(self.tickets.search(query, limit).await?)
    }

    /// Queues the client notification and the broadcast to every analyst
    /// tier. Notification failures never fail the ticket operation; a
    /// directory lookup error is logged and that tier is skipped.
    async fn notify_event(&self, ticket: &SecurityTicket, event: &str) {
        let summary = ticket.summary();

        self.dispatcher
            .enqueue(Notification::new(
                format!("[Client Alert] Ticket {event}"),
                summary.clone(),
                ticket.client_email.clone(),
            ))
            .await;

        for level in &self.policy.escalation_levels {
            let emails = match self.directory.emails_for_level(level).await {
                Ok(emails) => emails,
                Err(e) => {
                    warn!(level, error = %e, "Analyst lookup failed; tier skipped");
                    continue;
                }
            };

            for email in emails {
                self.dispatcher
                    .enqueue(Notification::new(
                        format!("[{level} Alert] Ticket {event}"),
                        summary.clone(),
                        email,
                    ))
                    .await;
            }
        }
    }

    async fn notify_assignee(&self, ticket: &SecurityTicket, assignee: &str) {
        self.dispatcher
            .enqueue(Notification::new(
                format!("[Assigned] Ticket {} assigned to you", ticket.id),
                format!(
                    "You have been assigned ticket {}.\n\n{}",
                    ticket.id,
                    ticket.summary()
                ),
                assignee.to_string(),
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mocks::{MockAnalystRepository, MockTicketRepository};
    use crate::notify::MockNotifier;

    struct Harness {
        repo: Arc<MockTicketRepository>,
        service: TicketService,
    }

    fn harness() -> Harness {
        let repo = Arc::new(MockTicketRepository::new());
        let directory = Arc::new(AnalystDirectory::new(
            Arc::new(MockAnalystRepository::new()),
            "fallback@example.com",
        ));
        let dispatcher = Arc::new(NotificationDispatcher::new(Arc::new(MockNotifier::new())));

        let service = TicketService::new(
            repo.clone(),
            directory,
            dispatcher,
            NotifyPolicy::default(),
        );

        Harness { repo, service }
    }

    fn new_ticket() -> NewTicket {
        NewTicket {
            event_id: "evt-1".to_string(),
            client_email: "client@example.com".to_string(),
            ..NewTicket::default()
        }
    }

    #[tokio::test]
    async fn test_create_requires_event_id_and_client_email() {
        let h = harness();

        let missing_event = NewTicket {
            event_id: String::new(),
            client_email: "client@example.com".to_string(),
            ..NewTicket::default()
        };
        assert!(matches!(
            h.service.create(missing_event).await,
            Err(TicketError::Validation(_))
        ));

        let missing_email = NewTicket {
            event_id: "evt-1".to_string(),
            client_email: "  ".to_string(),
            ..NewTicket::default()
        };
        assert!(matches!(
            h.service.create(missing_email).await,
            Err(TicketError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_defaults_to_new_status() {
        let h = harness();

        let ticket = h.service.create(new_ticket()).await.unwrap();
        assert_eq!(ticket.status, TicketStatus::New);
        assert_eq!(ticket.severity, "low");
        assert!(ticket.assigned_to.is_none());
    }

    #[tokio::test]
    async fn test_close_resolves_and_appends_notes() {
        let h = harness();
        let ticket = h.service.create(new_ticket()).await.unwrap();

        let closed = h
            .service
            .close(ticket.id, Some("patched the host"), "alice")
            .await
            .unwrap();

        assert_eq!(closed.status, TicketStatus::Resolved);
        assert!(closed.notes.contains("CLOSURE NOTES"));
        assert!(closed.notes.contains("patched the host"));
    }

    #[tokio::test]
    async fn test_close_twice_is_invalid_transition() {
        let h = harness();
        let ticket = h.service.create(new_ticket()).await.unwrap();

        h.service.close(ticket.id, None, "alice").await.unwrap();
        assert!(matches!(
            h.service.close(ticket.id, None, "alice").await,
            Err(TicketError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_reopen_requires_resolved() {
        let h = harness();
        let ticket = h.service.create(new_ticket()).await.unwrap();

        assert!(matches!(
            h.service.reopen(ticket.id, "alice").await,
            Err(TicketError::InvalidTransition(_))
        ));

        h.service.close(ticket.id, None, "alice").await.unwrap();
        let reopened = h.service.reopen(ticket.id, "alice").await.unwrap();
        assert_eq!(reopened.status, TicketStatus::InProgress);
    }

    #[tokio::test]
    async fn test_each_transition_writes_one_history_entry() {
        let h = harness();
        let ticket = h.service.create(new_ticket()).await.unwrap();

        h.service.assign(ticket.id, "bob", "alice").await.unwrap();
        h.service.close(ticket.id, None, "alice").await.unwrap();
        h.service.reopen(ticket.id, "alice").await.unwrap();

        let history = h.service.history(ticket.id).await.unwrap();
        assert_eq!(history.len(), 3);

        assert_eq!(history[0].field_changed, "assigned_to");
        assert_eq!(history[0].old_value, None);
        assert_eq!(history[0].new_value, Some("bob".to_string()));

        assert_eq!(history[1].field_changed, "status");
        assert_eq!(history[1].old_value, Some("new".to_string()));
        assert_eq!(history[1].new_value, Some("resolved".to_string()));

        assert_eq!(history[2].field_changed, "status");
        assert_eq!(history[2].old_value, Some("resolved".to_string()));
        assert_eq!(history[2].new_value, Some("in_progress".to_string()));
    }

    #[tokio::test]
    async fn test_assign_keeps_status_unchanged() {
        let h = harness();
        let ticket = h.service.create(new_ticket()).await.unwrap();
        h.service.close(ticket.id, None, "alice").await.unwrap();

        let assigned = h.service.assign(ticket.id, "bob", "alice").await.unwrap();
        assert_eq!(assigned.status, TicketStatus::Resolved);
        assert_eq!(assigned.assigned_to, Some("bob".to_string()));
    }

    #[tokio::test]
    async fn test_operations_on_missing_ticket_are_not_found() {
        let h = harness();
        let missing = Uuid::new_v4();

        assert!(matches!(
            h.service.assign(missing, "bob", "alice").await,
            Err(TicketError::NotFound(_))
        ));
        assert!(matches!(
            h.service.close(missing, None, "alice").await,
            Err(TicketError::NotFound(_))
        ));
        assert!(matches!(
            h.service.reopen(missing, "alice").await,
            Err(TicketError::NotFound(_))
        ));
        assert!(matches!(
            h.service.share(missing).await,
            Err(TicketError::NotFound(_))
        ));

        assert!(h.repo.history_snapshot().await.is_empty());
    }
}

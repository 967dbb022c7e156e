//! Security ticket repository for database operations.
//!
//! The ticket update surface is deliberately narrow: every mutation carries
//! its audit history entry and both are committed in one transaction, so a
//! ticket can never change without a matching history row.

use super::log_repo::{parse_timestamp, parse_uuid};
use super::{make_like_pattern, DbError, DbPool};
use crate::model::{SecurityTicket, TicketHistoryEntry, TicketStatus};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Repository trait for security tickets and their audit history.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Inserts a new ticket.
    async fn create(&self, ticket: &SecurityTicket) -> Result<(), DbError>;

    /// Gets a ticket by id.
    async fn get(&self, id: Uuid) -> Result<Option<SecurityTicket>, DbError>;

    /// Persists a mutated ticket together with the history entry describing
    /// the change. The update and the history insert commit atomically.
    async fn update_with_history(
        &self,
        ticket: &SecurityTicket,
        entry: &TicketHistoryEntry,
    ) -> Result<(), DbError>;

    /// Returns the audit history for a ticket, oldest first.
    async fn history(&self, ticket_id: Uuid) -> Result<Vec<TicketHistoryEntry>, DbError>;

    /// Searches tickets by event id, notes, or assignee. Most recently
    /// updated first.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SecurityTicket>, DbError>;
}

/// SQLite implementation of [`TicketRepository`].
pub struct SqliteTicketRepository {
    pool: DbPool,
}

impl SqliteTicketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for SqliteTicketRepository {
    async fn create(&self, ticket: &SecurityTicket) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO security_tickets (id, event_id, status, severity, assigned_to, notes, updated_at, client_email)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(ticket.id.to_string())
        .bind(&ticket.event_id)
        .bind(ticket.status.as_db_str())
        .bind(&ticket.severity)
        .bind(&ticket.assigned_to)
        .bind(&ticket.notes)
        .bind(ticket.updated_at.to_rfc3339())
        .bind(&ticket.client_email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SecurityTicket>, DbError> {
        let row: Option<TicketRow> = sqlx::query_as(
            "SELECT id, event_id, status, severity, assigned_to, notes, updated_at, client_email
             FROM security_tickets WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_into()?)),
            None => Ok(None),
        }
    }

    async fn update_with_history(
        &self,
        ticket: &SecurityTicket,
        entry: &TicketHistoryEntry,
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE security_tickets
             SET status = ?, severity = ?, assigned_to = ?, notes = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(ticket.status.as_db_str())
        .bind(&ticket.severity)
        .bind(&ticket.assigned_to)
        .bind(&ticket.notes)
        .bind(ticket.updated_at.to_rfc3339())
        .bind(ticket.id.to_string())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO ticket_history (id, ticket_id, field_changed, old_value, new_value, changed_by, changed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.ticket_id.to_string())
        .bind(&entry.field_changed)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(&entry.changed_by)
        .bind(entry.changed_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn history(&self, ticket_id: Uuid) -> Result<Vec<TicketHistoryEntry>, DbError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            "SELECT id, ticket_id, field_changed, old_value, new_value, changed_by, changed_at
             FROM ticket_history
             WHERE ticket_id = ?
             ORDER BY changed_at ASC",
        )
        .bind(ticket_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SecurityTicket>, DbError> {
        let pattern = make_like_pattern(query);

        let rows: Vec<TicketRow> = sqlx::query_as(
            r"SELECT id, event_id, status, severity, assigned_to, notes, updated_at, client_email
              FROM security_tickets
              WHERE event_id LIKE ? ESCAPE '\'
                 OR notes LIKE ? ESCAPE '\'
                 OR assigned_to LIKE ? ESCAPE '\'
              ORDER BY updated_at DESC
              LIMIT ?",
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

/// Creates the ticket repository for the given pool.
pub fn create_ticket_repository(pool: &DbPool) -> Arc<dyn TicketRepository> {
    Arc::new(SqliteTicketRepository::new(pool.clone()))
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: String,
    event_id: String,
    status: String,
    severity: String,
    assigned_to: Option<String>,
    notes: String,
    updated_at: String,
    client_email: String,
}

impl TryFrom<TicketRow> for SecurityTicket {
    type Error = DbError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status = TicketStatus::from_db_str(&row.status).ok_or_else(|| {
            DbError::Serialization(format!("invalid ticket status '{}'", row.status))
        })?;

        Ok(SecurityTicket {
            id: parse_uuid(&row.id)?,
            event_id: row.event_id,
            status,
            severity: row.severity,
            assigned_to: row.assigned_to,
            notes: row.notes,
            updated_at: parse_timestamp(&row.updated_at)?,
            client_email: row.client_email,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: String,
    ticket_id: String,
    field_changed: String,
    old_value: Option<String>,
    new_value: Option<String>,
    changed_by: String,
    changed_at: String,
}

impl TryFrom<HistoryRow> for TicketHistoryEntry {
    type Error = DbError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(TicketHistoryEntry {
            id: parse_uuid(&row.id)?,
            ticket_id: parse_uuid(&row.ticket_id)?,
            field_changed: row.field_changed,
            old_value: row.old_value,
            new_value: row.new_value,
            changed_by: row.changed_by,
            changed_at: parse_timestamp(&row.changed_at)?,
        })
    }
}

//! Correlated alert repository for database operations.

use super::log_repo::{parse_timestamp, parse_uuid};
use super::{DbError, DbPool};
use crate::model::CorrelatedAlert;
use async_trait::async_trait;
use std::sync::Arc;

/// Repository trait for derived correlated alerts. Append-only.
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Inserts a new correlated alert.
    async fn insert(&self, alert: &CorrelatedAlert) -> Result<(), DbError>;

    /// Returns the most recently emitted alerts, newest first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<CorrelatedAlert>, DbError>;
}

/// SQLite implementation of [`AlertRepository`].
pub struct SqliteAlertRepository {
    pool: DbPool,
}

impl SqliteAlertRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertRepository for SqliteAlertRepository {
    async fn insert(&self, alert: &CorrelatedAlert) -> Result<(), DbError> {
        let related = serde_json::to_string(&alert.related_event_ids)?;

        sqlx::query(
            r#"
            INSERT INTO correlated_alerts (id, correlation_type, related_event_ids, severity, agent_id, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(alert.id.to_string())
        .bind(&alert.correlation_type)
        .bind(&related)
        .bind(&alert.severity)
        .bind(&alert.agent_id)
        .bind(&alert.notes)
        .bind(alert.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<CorrelatedAlert>, DbError> {
        let rows: Vec<AlertRow> = sqlx::query_as(
            "SELECT id, correlation_type, related_event_ids, severity, agent_id, notes, created_at
             FROM correlated_alerts
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

/// Creates the alert repository for the given pool.
pub fn create_alert_repository(pool: &DbPool) -> Arc<dyn AlertRepository> {
    Arc::new(SqliteAlertRepository::new(pool.clone()))
}

#[derive(sqlx::FromRow)]
struct AlertRow {
    id: String,
    correlation_type: String,
    related_event_ids: String,
    severity: String,
    agent_id: Option<String>,
    notes: String,
    created_at: String,
}

impl TryFrom<AlertRow> for CorrelatedAlert {
    type Error = DbError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(CorrelatedAlert {
            id: parse_uuid(&row.id)?,
            correlation_type: row.correlation_type,
            related_event_ids: serde_json::from_str(&row.related_event_ids)?,
            severity: row.severity,
            agent_id: row.agent_id,
            notes: row.notes,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

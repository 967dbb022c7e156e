//! Log record repository for database operations.

use super::{make_like_pattern, DbError, DbPool};
use crate::model::LogRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Repository trait for the durable event store.
///
/// Log records are append-only: there is no update or delete surface.
#[async_trait]
pub trait LogRepository: Send + Sync {
    /// Inserts a new log record.
    async fn insert(&self, record: &LogRecord) -> Result<(), DbError>;

    /// Counts records for the given agent whose raw log text contains
    /// `keyword` (case-insensitively) and whose timestamp is after `since`.
    ///
    /// An absent agent id matches nothing: events without agent identity
    /// never contribute to a correlation window.
    async fn count_matching(
        &self,
        agent_id: Option<&str>,
        keyword: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, DbError>;

    /// Searches records by event id, rule description, or agent name.
    /// Returns the most recent matches first.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<LogRecord>, DbError>;
}

/// SQLite implementation of [`LogRepository`].
pub struct SqliteLogRepository {
    pool: DbPool,
}

impl SqliteLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogRepository for SqliteLogRepository {
    async fn insert(&self, record: &LogRecord) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO logs (
                id, event_id, timestamp, rule_level, rule_description, rule_id,
                mitre_ids, mitre_tactics, mitre_techniques,
                agent_id, agent_name, manager_name,
                full_log, location, command, src_user, dst_user, tty, cwd
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.event_id)
        .bind(record.timestamp.to_rfc3339())
        .bind(record.rule_level)
        .bind(&record.rule_description)
        .bind(&record.rule_id)
        .bind(&record.mitre_ids)
        .bind(&record.mitre_tactics)
        .bind(&record.mitre_techniques)
        .bind(&record.agent_id)
        .bind(&record.agent_name)
        .bind(&record.manager_name)
        .bind(&record.full_log)
        .bind(&record.location)
        .bind(&record.command)
        .bind(&record.src_user)
        .bind(&record.dst_user)
        .bind(&record.tty)
        .bind(&record.cwd)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_matching(
        &self,
        agent_id: Option<&str>,
        keyword: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        let Some(agent_id) = agent_id else {
            return Ok(0);
        };

        let count: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM logs
              WHERE agent_id = ? AND full_log LIKE ? ESCAPE '\' AND timestamp > ?",
        )
        .bind(agent_id)
        .bind(make_like_pattern(keyword))
        .bind(since.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<LogRecord>, DbError> {
        let pattern = make_like_pattern(query);

        let rows: Vec<LogRow> = sqlx::query_as(
            r"SELECT id, event_id, timestamp, rule_level, rule_description, rule_id,
                     mitre_ids, mitre_tactics, mitre_techniques,
                     agent_id, agent_name, manager_name,
                     full_log, location, command, src_user, dst_user, tty, cwd
              FROM logs
              WHERE event_id LIKE ? ESCAPE '\'
                 OR rule_description LIKE ? ESCAPE '\'
                 OR agent_name LIKE ? ESCAPE '\'
              ORDER BY timestamp DESC
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

/// Creates the log repository for the given pool.
pub fn create_log_repository(pool: &DbPool) -> Arc<dyn LogRepository> {
    Arc::new(SqliteLogRepository::new(pool.clone()))
}

#[derive(sqlx::FromRow)]
struct LogRow {
    id: String,
    event_id: String,
    timestamp: String,
    rule_level: i64,
    rule_description: Option<String>,
    rule_id: Option<String>,
    mitre_ids: Option<String>,
    mitre_tactics: Option<String>,
    mitre_techniques: Option<String>,
    agent_id: Option<String>,
    agent_name: Option<String>,
    manager_name: Option<String>,
    full_log: String,
    location: Option<String>,
    command: Option<String>,
    src_user: Option<String>,
    dst_user: Option<String>,
    tty: Option<String>,
    cwd: Option<String>,
}

impl TryFrom<LogRow> for LogRecord {
    type Error = DbError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        Ok(LogRecord {
            id: parse_uuid(&row.id)?,
            event_id: row.event_id,
            timestamp: parse_timestamp(&row.timestamp)?,
            rule_level: row.rule_level,
            rule_description: row.rule_description,
            rule_id: row.rule_id,
            mitre_ids: row.mitre_ids,
            mitre_tactics: row.mitre_tactics,
            mitre_techniques: row.mitre_techniques,
            agent_id: row.agent_id,
            agent_name: row.agent_name,
            manager_name: row.manager_name,
            full_log: row.full_log,
            location: row.location,
            command: row.command,
            src_user: row.src_user,
            dst_user: row.dst_user,
            tty: row.tty,
            cwd: row.cwd,
        })
    }
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Serialization(format!("invalid uuid '{s}': {e}")))
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Serialization(format!("invalid timestamp '{s}': {e}")))
}

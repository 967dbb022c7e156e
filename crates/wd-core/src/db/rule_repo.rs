//! Correlation rule repository for database operations.

use super::log_repo::{parse_timestamp, parse_uuid};
use super::{DbError, DbPool};
use crate::model::CorrelationRule;
use async_trait::async_trait;
use std::sync::Arc;

/// Repository trait for operator-authored correlation rules.
///
/// Rules are read in full on every evaluation; there is no ordering
/// guarantee and no caching across requests.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Inserts a new correlation rule.
    async fn insert(&self, rule: &CorrelationRule) -> Result<(), DbError>;

    /// Returns all rules.
    async fn list_all(&self) -> Result<Vec<CorrelationRule>, DbError>;
}

/// SQLite implementation of [`RuleRepository`].
pub struct SqliteRuleRepository {
    pool: DbPool,
}

impl SqliteRuleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleRepository for SqliteRuleRepository {
    async fn insert(&self, rule: &CorrelationRule) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO correlation_rules (id, name, keyword, threshold, window_secs, severity, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(rule.id.to_string())
        .bind(&rule.name)
        .bind(&rule.keyword)
        .bind(rule.threshold)
        .bind(rule.window_secs)
        .bind(&rule.severity)
        .bind(&rule.description)
        .bind(rule.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<CorrelationRule>, DbError> {
        let rows: Vec<RuleRow> = sqlx::query_as(
            "SELECT id, name, keyword, threshold, window_secs, severity, description, created_at
             FROM correlation_rules",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

/// Creates the rule repository for the given pool.
pub fn create_rule_repository(pool: &DbPool) -> Arc<dyn RuleRepository> {
    Arc::new(SqliteRuleRepository::new(pool.clone()))
}

#[derive(sqlx::FromRow)]
struct RuleRow {
    id: String,
    name: String,
    keyword: String,
    threshold: i64,
    window_secs: i64,
    severity: String,
    description: Option<String>,
    created_at: String,
}

impl TryFrom<RuleRow> for CorrelationRule {
    type Error = DbError;

    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        Ok(CorrelationRule {
            id: parse_uuid(&row.id)?,
            name: row.name,
            keyword: row.keyword,
            threshold: row.threshold,
            window_secs: row.window_secs,
            severity: row.severity,
            description: row.description,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

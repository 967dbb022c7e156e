//! Analyst role repository for database operations.

use super::log_repo::parse_uuid;
use super::{DbError, DbPool};
use crate::model::AnalystRole;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Repository trait for analyst escalation roles.
#[async_trait]
pub trait AnalystRepository: Send + Sync {
    /// Inserts a new role row.
    async fn insert(&self, role: &AnalystRole) -> Result<(), DbError>;

    /// Returns all roles, ordered by level.
    async fn list_all(&self) -> Result<Vec<AnalystRole>, DbError>;

    /// Returns all roles registered for a level.
    async fn list_by_level(&self, level: &str) -> Result<Vec<AnalystRole>, DbError>;

    /// Updates a role row. Returns false if the row does not exist.
    async fn update(&self, id: Uuid, level: &str, email: &str) -> Result<bool, DbError>;

    /// Deletes a role row. Returns false if the row does not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;
}

/// SQLite implementation of [`AnalystRepository`].
pub struct SqliteAnalystRepository {
    pool: DbPool,
}

impl SqliteAnalystRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalystRepository for SqliteAnalystRepository {
    async fn insert(&self, role: &AnalystRole) -> Result<(), DbError> {
        sqlx::query("INSERT INTO analyst_roles (id, level, email) VALUES (?, ?, ?)")
            .bind(role.id.to_string())
            .bind(&role.level)
            .bind(&role.email)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<AnalystRole>, DbError> {
        let rows: Vec<AnalystRow> =
            sqlx::query_as("SELECT id, level, email FROM analyst_roles ORDER BY level")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_by_level(&self, level: &str) -> Result<Vec<AnalystRole>, DbError> {
        let rows: Vec<AnalystRow> =
            sqlx::query_as("SELECT id, level, email FROM analyst_roles WHERE level = ?")
                .bind(level)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn update(&self, id: Uuid, level: &str, email: &str) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE analyst_roles SET level = ?, email = ? WHERE id = ?")
            .bind(level)
            .bind(email)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM analyst_roles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Creates the analyst repository for the given pool.
pub fn create_analyst_repository(pool: &DbPool) -> Arc<dyn AnalystRepository> {
    Arc::new(SqliteAnalystRepository::new(pool.clone()))
}

#[derive(sqlx::FromRow)]
struct AnalystRow {
    id: String,
    level: String,
    email: String,
}

impl TryFrom<AnalystRow> for AnalystRole {
    type Error = DbError;

    fn try_from(row: AnalystRow) -> Result<Self, Self::Error> {
        Ok(AnalystRole {
            id: parse_uuid(&row.id)?,
            level: row.level,
            email: row.email,
        })
    }
}

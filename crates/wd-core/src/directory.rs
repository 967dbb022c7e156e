//! Analyst directory.
//!
//! Maps escalation levels to notification addresses. A level with no
//! registered analyst falls back to the configured default address so
//! escalation notifications never silently vanish.

use crate::db::{AnalystRepository, DbError};
use crate::model::AnalystRole;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Errors raised by directory operations.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// Missing or malformed input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced analyst row does not exist.
    #[error("Analyst not found: {0}")]
    NotFound(Uuid),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] DbError),
}

/// CRUD over (level, email) pairs plus the level lookup used by the
/// notification fan-out.
pub struct AnalystDirectory {
    repo: Arc<dyn AnalystRepository>,
    default_email: String,
}

impl AnalystDirectory {
    /// Creates a directory backed by the given repository. `default_email`
    /// is returned by [`emails_for_level`](Self::emails_for_level) when a
    /// level has no registered analyst.
    pub fn new(repo: Arc<dyn AnalystRepository>, default_email: impl Into<String>) -> Self {
        Self {
            repo,
            default_email: default_email.into(),
        }
    }

    /// Registers a new analyst address for a level.
    pub async fn add(&self, level: &str, email: &str) -> Result<AnalystRole, DirectoryError> {
        if level.trim().is_empty() || email.trim().is_empty() {
            return Err(DirectoryError::Validation(
                "level and email are required".to_string(),
            ));
        }

        let role = AnalystRole {
            id: Uuid::new_v4(),
            level: level.to_string(),
            email: email.to_string(),
        };
        self.repo.insert(&role).await?;
        Ok(role)
    }

    /// Returns all registered analysts, ordered by level.
    pub async fn all(&self) -> Result<Vec<AnalystRole>, DirectoryError> {
        Ok(self.repo.list_all().await?)
    }

    /// Returns the analysts registered for a level.
    pub async fn by_level(&self, level: &str) -> Result<Vec<AnalystRole>, DirectoryError> {
        Ok(self.repo.list_by_level(level).await?)
    }

    /// Replaces the level and email of an existing row.
    pub async fn update(
        &self,
        id: Uuid,
        level: &str,
        email: &str,
    ) -> Result<(), DirectoryError> {
        if level.trim().is_empty() || email.trim().is_empty() {
            return Err(DirectoryError::Validation(
                "level and email are required".to_string(),
            ));
        }

        if self.repo.update(id, level, email).await? {
            Ok(())
        } else {
            Err(DirectoryError::NotFound(id))
        }
    }

    /// Removes an analyst row.
    pub async fn remove(&self, id: Uuid) -> Result<(), DirectoryError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(DirectoryError::NotFound(id))
        }
    }

    /// Returns every address registered for `level`, or the configured
    /// default address if the level has none.
    pub async fn emails_for_level(&self, level: &str) -> Result<Vec<String>, DirectoryError> {
        let roles = self.repo.list_by_level(level).await?;
        if roles.is_empty() {
            debug!(level, "No analysts registered; using default address");
            return Ok(vec![self.default_email.clone()]);
        }
        Ok(roles.into_iter().map(|r| r.email).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mocks::MockAnalystRepository;

    fn directory_with(roles: Vec<AnalystRole>) -> AnalystDirectory {
        AnalystDirectory::new(
            Arc::new(MockAnalystRepository::with_roles(roles)),
            "fallback@example.com",
        )
    }

    fn role(level: &str, email: &str) -> AnalystRole {
        AnalystRole {
            id: Uuid::new_v4(),
            level: level.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_emails_for_level_returns_default_when_empty() {
        let directory = directory_with(vec![role("L2", "l2@example.com")]);

        let emails = directory.emails_for_level("L1").await.unwrap();
        assert_eq!(emails, vec!["fallback@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_emails_for_level_returns_all_matches() {
        let directory = directory_with(vec![
            role("L1", "alice@example.com"),
            role("L1", "bob@example.com"),
            role("L2", "carol@example.com"),
        ]);

        let emails = directory.emails_for_level("L1").await.unwrap();
        assert_eq!(emails.len(), 2);
        assert!(emails.contains(&"alice@example.com".to_string()));
        assert!(emails.contains(&"bob@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_add_rejects_blank_fields() {
        let directory = directory_with(vec![]);

        assert!(matches!(
            directory.add("", "a@example.com").await,
            Err(DirectoryError::Validation(_))
        ));
        assert!(matches!(
            directory.add("L1", "  ").await,
            Err(DirectoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let directory = directory_with(vec![]);

        let missing = Uuid::new_v4();
        assert!(matches!(
            directory.update(missing, "L1", "a@example.com").await,
            Err(DirectoryError::NotFound(id)) if id == missing
        ));
    }
}

//! Mock implementation of AnalystRepository for testing.

use crate::db::{AnalystRepository, DbError};
use crate::model::AnalystRole;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Mock implementation of [`AnalystRepository`] using in-memory storage.
#[derive(Default)]
pub struct MockAnalystRepository {
    roles: Arc<RwLock<Vec<AnalystRole>>>,
}

impl MockAnalystRepository {
    /// Creates a new mock repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock repository pre-populated with roles.
    pub fn with_roles(roles: Vec<AnalystRole>) -> Self {
        Self {
            roles: Arc::new(RwLock::new(roles)),
        }
    }
}

#[async_trait]
impl AnalystRepository for MockAnalystRepository {
    async fn insert(&self, role: &AnalystRole) -> Result<(), DbError> {
        self.roles.write().await.push(role.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<AnalystRole>, DbError> {
        let mut roles = self.roles.read().await.clone();
        roles.sort_by(|a, b| a.level.cmp(&b.level));
        Ok(roles)
    }

    async fn list_by_level(&self, level: &str) -> Result<Vec<AnalystRole>, DbError> {
        Ok(self
            .roles
            .read()
            .await
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, level: &str, email: &str) -> Result<bool, DbError> {
        let mut roles = self.roles.write().await;
        match roles.iter_mut().find(|r| r.id == id) {
            Some(role) => {
                role.level = level.to_string();
                role.email = email.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let mut roles = self.roles.write().await;
        let before = roles.len();
        roles.retain(|r| r.id != id);
        Ok(roles.len() < before)
    }
}

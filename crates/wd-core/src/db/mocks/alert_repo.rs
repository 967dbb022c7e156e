//! Mock implementation of AlertRepository for testing.

use crate::db::{AlertRepository, DbError};
use crate::model::CorrelatedAlert;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock implementation of [`AlertRepository`] using in-memory storage.
#[derive(Default)]
pub struct MockAlertRepository {
    alerts: Arc<RwLock<Vec<CorrelatedAlert>>>,
}

impl MockAlertRepository {
    /// Creates a new mock repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a snapshot of all stored alerts.
    pub async fn snapshot(&self) -> Vec<CorrelatedAlert> {
        self.alerts.read().await.clone()
    }
}

#[async_trait]
impl AlertRepository for MockAlertRepository {
    async fn insert(&self, alert: &CorrelatedAlert) -> Result<(), DbError> {
        self.alerts.write().await.push(alert.clone());
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<CorrelatedAlert>, DbError> {
        let alerts = self.alerts.read().await;
        let mut recent: Vec<CorrelatedAlert> = alerts.clone();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit as usize);
        Ok(recent)
    }
}

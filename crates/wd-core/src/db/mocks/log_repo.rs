//! Mock implementation of LogRepository for testing.

use crate::db::{DbError, LogRepository};
use crate::model::LogRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock implementation of [`LogRepository`] using in-memory storage.
#[derive(Default)]
pub struct MockLogRepository {
    records: Arc<RwLock<Vec<LogRecord>>>,
}

impl MockLogRepository {
    /// Creates a new mock repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a snapshot of all stored records.
    pub async fn snapshot(&self) -> Vec<LogRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl LogRepository for MockLogRepository {
    async fn insert(&self, record: &LogRecord) -> Result<(), DbError> {
        self.records.write().await.push(record.clone());
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

        let keyword = keyword.to_lowercase();
        let records = self.records.read().await;
        let count = records
            .iter()
            .filter(|r| r.agent_id.as_deref() == Some(agent_id))
            .filter(|r| r.full_log.to_lowercase().contains(&keyword))
            .filter(|r| r.timestamp > since)
            .count();

        Ok(count as i64)
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<LogRecord>, DbError> {
        let query = query.to_lowercase();
        let records = self.records.read().await;

        let mut matches: Vec<LogRecord> = records
            .iter()
            .filter(|r| {
                r.event_id.to_lowercase().contains(&query)
                    || r.rule_description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&query))
                    || r.agent_name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&query))
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matches.truncate(limit as usize);
        Ok(matches)
    }
}

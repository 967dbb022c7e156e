//! Mock implementation of RuleRepository for testing.

use crate::db::{DbError, RuleRepository};
use crate::model::CorrelationRule;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock implementation of [`RuleRepository`] using in-memory storage.
#[derive(Default)]
pub struct MockRuleRepository {
    rules: Arc<RwLock<Vec<CorrelationRule>>>,
}

impl MockRuleRepository {
    /// Creates a new mock repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock repository pre-populated with rules.
    pub fn with_rules(rules: Vec<CorrelationRule>) -> Self {
        Self {
            rules: Arc::new(RwLock::new(rules)),
        }
    }
}

#[async_trait]
impl RuleRepository for MockRuleRepository {
    async fn insert(&self, rule: &CorrelationRule) -> Result<(), DbError> {
        self.rules.write().await.push(rule.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<CorrelationRule>, DbError> {
        Ok(self.rules.read().await.clone())
    }
}

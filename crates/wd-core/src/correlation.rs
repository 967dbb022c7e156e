//! Correlation engine.
//!
//! Evaluates every correlation rule against a newly ingested event: when a
//! rule's keyword occurs in the event's raw log text, the engine counts how
//! many events from the same agent contain that keyword inside the rule's
//! time window (the just-inserted event included) and, at or above the
//! threshold, emits a [`CorrelatedAlert`] and queues a notification.
//!
//! The check deliberately re-fires on every qualifying event, not only on
//! the first threshold crossing: a sustained keyword burst produces one
//! alert and one notification per qualifying event.

use crate::db::{AlertRepository, DbError, LogRepository, RuleRepository};
use crate::model::{CorrelatedAlert, CorrelationRule, LogRecord};
use crate::notify::{Notification, NotificationDispatcher, NotifyPolicy};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Errors raised during rule evaluation.
#[derive(Error, Debug)]
pub enum CorrelationError {
    /// Persistence failure while reading rules or counting events.
    #[error(transparent)]
    Store(#[from] DbError),
}

/// Evaluates correlation rules against ingested events.
pub struct CorrelationEngine {
    rules: Arc<dyn RuleRepository>,
    logs: Arc<dyn LogRepository>,
    alerts: Arc<dyn AlertRepository>,
    dispatcher: Arc<NotificationDispatcher>,
    policy: NotifyPolicy,
    // Serializes evaluation per agent so two concurrent events for the same
    // agent cannot race the windowed count. Rules for different agents
    // evaluate without contention.
    agent_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CorrelationEngine {
    /// Creates an engine over the given repositories and dispatcher.
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        logs: Arc<dyn LogRepository>,
        alerts: Arc<dyn AlertRepository>,
        dispatcher: Arc<NotificationDispatcher>,
        policy: NotifyPolicy,
    ) -> Self {
        Self {
            rules,
            logs,
            alerts,
            dispatcher,
            policy,
            agent_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluates all rules against one event and returns the alerts that
    /// fired. Rules are independent: several may fire for the same event.
    pub async fn evaluate(
        &self,
        record: &LogRecord,
    ) -> Result<Vec<CorrelatedAlert>, CorrelationError> {
        let rules = self.rules.list_all().await?;
        if rules.is_empty() {
            return Ok(Vec::new());
        }

        let _guard = match &record.agent_id {
            Some(agent_id) => {
                let lock = self.lock_for_agent(agent_id).await;
                Some(lock.lock_owned().await)
            }
            None => None,
        };

        let mut emitted = Vec::new();
        for rule in &rules {
            if !rule.matches(&record.full_log) {
                continue;
            }

            let since = Utc::now() - rule.window();
            let count = self
                .logs
                .count_matching(record.agent_id.as_deref(), &rule.keyword, since)
                .await?;

            debug!(
                rule = %rule.name,
                keyword = %rule.keyword,
                count,
                threshold = rule.threshold,
                "Evaluated correlation rule"
            );

            if count >= rule.threshold {
                let alert = self.emit_alert(rule, record, count).await?;
                emitted.push(alert);
            }
        }

        Ok(emitted)
    }

    async fn emit_alert(
        &self,
        rule: &CorrelationRule,
        record: &LogRecord,
        count: i64,
    ) -> Result<CorrelatedAlert, CorrelationError> {
        let alert = CorrelatedAlert {
            id: Uuid::new_v4(),
            correlation_type: rule.name.clone(),
            related_event_ids: vec![record.event_id.clone()],
            severity: rule.severity.clone(),
            agent_id: record.agent_id.clone(),
            notes: format!(
                "{} events with keyword '{}' within {}s.",
                count, rule.keyword, rule.window_secs
            ),
            created_at: Utc::now(),
        };

        self.alerts.insert(&alert).await?;

        info!(
            rule = %rule.name,
            agent = record.agent_id.as_deref().unwrap_or("unknown"),
            count,
            "Correlation rule fired"
        );

        self.dispatcher
            .enqueue(Notification::new(
                format!("Correlation alert: {}", rule.name),
                format!(
                    "{}\n\nDetected {} events for agent {} within {}s.",
                    rule.description.as_deref().unwrap_or(&rule.name),
                    count,
                    record.agent_id.as_deref().unwrap_or("unknown"),
                    rule.window_secs
                ),
                self.policy.default_recipient.clone(),
            ))
            .await;

        Ok(alert)
    }

    async fn lock_for_agent(&self, agent_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.agent_locks.lock().await;
        Arc::clone(
            locks
                .entry(agent_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

//! Event ingestion.
//!
//! Normalizes raw agent payloads into [`LogRecord`]s, persists them, and
//! runs correlation before returning. Events at or above the high-severity
//! threshold additionally queue a direct notification carrying the raw
//! payload, independent of any rule matching.

use crate::correlation::{CorrelationEngine, CorrelationError};
use crate::db::{DbError, LogRepository};
use crate::model::{EventPayload, LogRecord};
use crate::notify::{Notification, NotificationDispatcher, NotifyPolicy};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Severity level at or above which an event triggers a direct
/// notification, regardless of correlation rules.
pub const HIGH_SEVERITY_THRESHOLD: i64 = 10;

/// Errors raised during ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    /// A required identifying field is absent.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] DbError),
}

impl From<CorrelationError> for IngestError {
    fn from(err: CorrelationError) -> Self {
        match err {
            CorrelationError::Store(e) => IngestError::Store(e),
        }
    }
}

/// Normalizes and persists incoming events, then runs correlation.
pub struct EventIngestor {
    logs: Arc<dyn LogRepository>,
    engine: Arc<CorrelationEngine>,
    dispatcher: Arc<NotificationDispatcher>,
    policy: NotifyPolicy,
}

impl EventIngestor {
    /// Creates an ingestor over the given collaborators.
    pub fn new(
        logs: Arc<dyn LogRepository>,
        engine: Arc<CorrelationEngine>,
        dispatcher: Arc<NotificationDispatcher>,
        policy: NotifyPolicy,
    ) -> Self {
        Self {
            logs,
            engine,
            dispatcher,
            policy,
        }
    }

    /// Ingests one event payload.
    ///
    /// Requires a source event id and raw log text; everything else is
    /// optional. Correlation runs synchronously before this returns, so a
    /// caller observing success knows any resulting alerts are persisted.
    pub async fn ingest(&self, payload: EventPayload) -> Result<LogRecord, IngestError> {
        let event_id = payload
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| IngestError::Validation("event id is required".to_string()))?;

        let full_log = payload
            .full_log
            .clone()
            .filter(|log| !log.trim().is_empty())
            .ok_or_else(|| IngestError::Validation("raw log text is required".to_string()))?;

        let record = LogRecord {
            id: Uuid::new_v4(),
            event_id,
            timestamp: payload.timestamp.unwrap_or_else(Utc::now),
            rule_level: payload.rule.level.unwrap_or(0),
            rule_description: payload.rule.description.clone(),
            rule_id: payload.rule.id.clone(),
            mitre_ids: payload.rule.mitre.id.clone(),
            mitre_tactics: payload.rule.mitre.tactic.clone(),
            mitre_techniques: payload.rule.mitre.technique.clone(),
            agent_id: payload.agent.id.clone(),
            agent_name: payload.agent.name.clone(),
            manager_name: payload.manager.name.clone(),
            full_log,
            location: payload.location.clone(),
            command: payload.data.command.clone(),
            src_user: payload.data.src_user.clone(),
            dst_user: payload.data.dst_user.clone(),
            tty: payload.data.tty.clone(),
            cwd: payload.data.cwd.clone(),
        };

        self.logs.insert(&record).await?;
        info!(
            event_id = %record.event_id,
            agent = record.agent_id.as_deref().unwrap_or("unknown"),
            level = record.rule_level,
            "Event stored"
        );

        self.engine.evaluate(&record).await?;

        if record.rule_level >= HIGH_SEVERITY_THRESHOLD {
            let body = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|_| record.full_log.clone());
            self.dispatcher
                .enqueue(Notification::new(
                    format!("High severity event: {}", record.event_id),
                    body,
                    self.policy.default_recipient.clone(),
                ))
                .await;
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mocks::{MockAlertRepository, MockLogRepository, MockRuleRepository};
    use crate::notify::MockNotifier;

    struct Harness {
        logs: Arc<MockLogRepository>,
        dispatcher: Arc<NotificationDispatcher>,
        ingestor: EventIngestor,
    }

    fn harness() -> Harness {
        let logs = Arc::new(MockLogRepository::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(Arc::new(MockNotifier::new())));

        let engine = Arc::new(CorrelationEngine::new(
            Arc::new(MockRuleRepository::new()),
            logs.clone(),
            Arc::new(MockAlertRepository::new()),
            dispatcher.clone(),
            NotifyPolicy::default(),
        ));

        let ingestor = EventIngestor::new(
            logs.clone(),
            engine,
            dispatcher.clone(),
            NotifyPolicy::default(),
        );

        Harness {
            logs,
            dispatcher,
            ingestor,
        }
    }

    fn payload(id: &str, level: i64, full_log: &str) -> EventPayload {
        EventPayload {
            id: Some(id.to_string()),
            full_log: Some(full_log.to_string()),
            rule: crate::model::RuleMeta {
                level: Some(level),
                ..Default::default()
            },
            agent: crate::model::AgentMeta {
                id: Some("agent-1".to_string()),
                name: Some("web-01".to_string()),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ingest_requires_event_id_and_raw_text() {
        let h = harness();

        let mut missing_id = payload("evt-1", 3, "some log line");
        missing_id.id = None;
        assert!(matches!(
            h.ingestor.ingest(missing_id).await,
            Err(IngestError::Validation(_))
        ));

        let mut missing_log = payload("evt-1", 3, "some log line");
        missing_log.full_log = Some("   ".to_string());
        assert!(matches!(
            h.ingestor.ingest(missing_log).await,
            Err(IngestError::Validation(_))
        ));

        assert!(h.logs.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_persists_normalized_record() {
        let h = harness();

        let record = h
            .ingestor
            .ingest(payload("evt-1", 5, "sshd: session opened"))
            .await
            .unwrap();

        assert_eq!(record.event_id, "evt-1");
        assert_eq!(record.rule_level, 5);
        assert_eq!(record.agent_id.as_deref(), Some("agent-1"));

        let stored = h.logs.snapshot().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].event_id, "evt-1");
    }

    #[tokio::test]
    async fn test_high_severity_queues_direct_notification() {
        let h = harness();

        h.ingestor
            .ingest(payload("evt-1", 12, "kernel: integrity violation"))
            .await
            .unwrap();
        assert_eq!(h.dispatcher.depth(), 1);

        h.ingestor
            .ingest(payload("evt-2", 9, "sshd: session opened"))
            .await
            .unwrap();
        // Below the threshold: no additional notification.
        assert_eq!(h.dispatcher.depth(), 1);
    }
}

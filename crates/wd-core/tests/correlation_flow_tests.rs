//! End-to-end correlation flow over a real SQLite store.
//!
//! Exercises ingest -> persist -> rule evaluation -> alert emission ->
//! notification drain with the production repositories.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use wd_core::db::{
    create_alert_repository, create_log_repository, create_pool, create_rule_repository,
    provision_schema, DbPool,
};
use wd_core::{
    CorrelationEngine, CorrelationRule, EventIngestor, EventPayload, MockNotifier,
    NotificationDispatcher, NotifyPolicy,
};

async fn setup_pool() -> DbPool {
    let url = format!(
        "sqlite:file:wdtest_{}?mode=memory&cache=shared",
        Uuid::new_v4().simple()
    );
    let pool = create_pool(&url).await.expect("pool");
    provision_schema(&pool).await.expect("schema");
    pool
}

struct Harness {
    pool: DbPool,
    notifier: Arc<MockNotifier>,
    dispatcher: Arc<NotificationDispatcher>,
    ingestor: EventIngestor,
}

async fn setup() -> Harness {
    let pool = setup_pool().await;

    let logs = create_log_repository(&pool);
    let rules = create_rule_repository(&pool);
    let alerts = create_alert_repository(&pool);

    let notifier = Arc::new(MockNotifier::new());
    let dispatcher = Arc::new(NotificationDispatcher::new(notifier.clone()));

    let engine = Arc::new(CorrelationEngine::new(
        rules,
        logs.clone(),
        alerts,
        dispatcher.clone(),
        NotifyPolicy::default(),
    ));
    let ingestor = EventIngestor::new(logs, engine, dispatcher.clone(), NotifyPolicy::default());

    Harness {
        pool,
        notifier,
        dispatcher,
        ingestor,
    }
}

fn brute_force_rule() -> CorrelationRule {
    CorrelationRule {
        id: Uuid::new_v4(),
        name: "ssh brute force".to_string(),
        keyword: "failed password".to_string(),
        threshold: 3,
        window_secs: 300,
        severity: "high".to_string(),
        description: Some("Repeated failed SSH logins".to_string()),
        created_at: chrono::Utc::now(),
    }
}

fn event(id: &str) -> EventPayload {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "rule": {"level": 3, "description": "sshd: authentication failed", "id": "5716"},
        "agent": {"id": "agent-1", "name": "web-01"},
        "manager": {"name": "manager-01"},
        "full_log": "sshd[1234]: Failed password for root from 10.0.0.5"
    }))
    .expect("payload")
}

#[tokio::test]
async fn test_threshold_met_on_third_event_emits_one_alert() {
    let h = setup().await;
    create_rule_repository(&h.pool)
        .insert(&brute_force_rule())
        .await
        .unwrap();

    h.ingestor.ingest(event("evt-1")).await.unwrap();
    h.ingestor.ingest(event("evt-2")).await.unwrap();

    let alerts = create_alert_repository(&h.pool);
    assert!(alerts.list_recent(50).await.unwrap().is_empty());

    h.ingestor.ingest(event("evt-3")).await.unwrap();

    let stored = alerts.list_recent(50).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].correlation_type, "ssh brute force");
    assert_eq!(stored[0].related_event_ids, vec!["evt-3".to_string()]);
    assert_eq!(stored[0].agent_id.as_deref(), Some("agent-1"));
    assert!(stored[0].notes.contains("3 events"));
}

#[tokio::test]
async fn test_every_qualifying_event_after_threshold_fires_again() {
    let h = setup().await;
    create_rule_repository(&h.pool)
        .insert(&brute_force_rule())
        .await
        .unwrap();

    for i in 1..=5 {
        h.ingestor.ingest(event(&format!("evt-{i}"))).await.unwrap();
    }

    // Events 3, 4, and 5 each qualify.
    let alerts = create_alert_repository(&h.pool);
    assert_eq!(alerts.list_recent(50).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_correlation_notification_is_queued_and_delivered() {
    let h = setup().await;
    create_rule_repository(&h.pool)
        .insert(&brute_force_rule())
        .await
        .unwrap();

    for i in 1..=3 {
        h.ingestor.ingest(event(&format!("evt-{i}"))).await.unwrap();
    }
    assert_eq!(h.dispatcher.depth(), 1);

    h.dispatcher.start().await.expect("consumer");
    assert!(h.notifier.wait_for(1, Duration::from_secs(2)).await);

    let delivered = h.notifier.deliveries().await;
    assert_eq!(delivered.len(), 1);
    assert!(delivered[0].subject.contains("ssh brute force"));
    assert!(delivered[0].body.contains("agent-1"));
    assert_eq!(h.dispatcher.depth(), 0);
}

#[tokio::test]
async fn test_high_severity_event_notifies_without_rules() {
    let h = setup().await;

    let payload: EventPayload = serde_json::from_value(serde_json::json!({
        "id": "evt-high",
        "rule": {"level": 12, "description": "rootkit detected"},
        "agent": {"id": "agent-9", "name": "db-01"},
        "full_log": "rootcheck: possible rootkit detected"
    }))
    .unwrap();

    h.ingestor.ingest(payload).await.unwrap();
    assert_eq!(h.dispatcher.depth(), 1);

    h.dispatcher.start().await.expect("consumer");
    assert!(h.notifier.wait_for(1, Duration::from_secs(2)).await);
    let delivered = h.notifier.deliveries().await;
    assert!(delivered[0].subject.contains("evt-high"));
}

#[tokio::test]
async fn test_search_returns_most_recent_first() {
    let h = setup().await;

    for i in 1..=5 {
        let mut payload = event(&format!("evt-{i}"));
        payload.timestamp = Some(chrono::Utc::now() - chrono::Duration::seconds(60 - i));
        h.ingestor.ingest(payload).await.unwrap();
    }

    let logs = create_log_repository(&h.pool);
    let found = logs.search("evt", 50).await.unwrap();
    assert_eq!(found.len(), 5);
    assert_eq!(found[0].event_id, "evt-5");
    assert_eq!(found[4].event_id, "evt-1");

    let limited = logs.search("evt", 2).await.unwrap();
    assert_eq!(limited.len(), 2);
}

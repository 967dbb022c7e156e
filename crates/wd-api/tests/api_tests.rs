//! Route-level tests over an in-memory store.
//!
//! Each test builds the full router with a fresh SQLite pool and a mock
//! notifier, then drives it with one-shot requests.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

use wd_api::{build_router, AppState};
use wd_core::db::{create_pool, provision_schema};
use wd_core::{MockNotifier, NotifyPolicy};

async fn test_app() -> Router {
    let url = format!(
        "sqlite:file:wdapi_{}?mode=memory&cache=shared",
        Uuid::new_v4().simple()
    );
    let pool = create_pool(&url).await.expect("pool");
    provision_schema(&pool).await.expect("schema");

    let state = AppState::new(&pool, Arc::new(MockNotifier::new()), NotifyPolicy::default());
    build_router(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn sample_event(id: &str) -> Value {
    json!({
        "id": id,
        "rule": {"level": 3, "description": "sshd: authentication failed", "id": "5716"},
        "agent": {"id": "agent-1", "name": "web-01"},
        "manager": {"name": "manager-01"},
        "full_log": "sshd[1234]: Failed password for root from 10.0.0.5"
    })
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_ingest_stores_event() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/logs", sample_event("evt-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["event_id"], "evt-1");

    let response = app
        .oneshot(get("/api/logs/search?q=evt-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ingest_rejects_missing_fields() {
    let app = test_app().await;

    let mut event = sample_event("evt-1");
    event["full_log"] = Value::Null;
    let response = app
        .oneshot(post_json("/api/logs", event))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_rule_creation_and_correlation() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/correlation-rules",
            json!({
                "name": "ssh brute force",
                "keyword": "failed password",
                "threshold": 3,
                "window_secs": 300,
                "severity": "high",
                "description": "Repeated failed SSH logins"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    for i in 1..=3 {
        let response = app
            .clone()
            .oneshot(post_json("/api/logs", sample_event(&format!("evt-{i}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/api/correlated-alerts")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let alerts = body.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["correlation_type"], "ssh brute force");
    assert_eq!(alerts[0]["related_event_ids"][0], "evt-3");
}

#[tokio::test]
async fn test_rule_creation_rejects_zero_threshold() {
    let app = test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/correlation-rules",
            json!({
                "name": "bad rule",
                "keyword": "x",
                "threshold": 0,
                "window_secs": 300,
                "severity": "low"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ticket_lifecycle_over_http() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/tickets",
            json!({"event_id": "A1", "client_email": "c@x.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let ticket_id = body_json(response).await["ticket_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/tickets/{ticket_id}/close"),
            json!({"notes": "fixed", "actor": "alice"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "resolved");
    assert!(body["notes"].as_str().unwrap().contains("fixed"));

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/tickets/{ticket_id}/close"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_TRANSITION");

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/tickets/{ticket_id}/reopen"),
            json!({"actor": "alice"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "in_progress");

    let response = app
        .oneshot(get(&format!("/api/tickets/{ticket_id}/history")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["field_changed"], "status");
    assert_eq!(history[0]["new_value"], "resolved");
    assert_eq!(history[1]["new_value"], "in_progress");
}

#[tokio::test]
async fn test_ticket_create_requires_client_email() {
    let app = test_app().await;

    let response = app
        .oneshot(post_json("/api/tickets", json!({"event_id": "A1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_ticket_operations_on_missing_ticket_return_404() {
    let app = test_app().await;
    let missing = Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/tickets/{missing}/assign"),
            json!({"assigned_to": "bob"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(post_json(
            &format!("/api/tickets/{missing}/email-client"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ticket_search() {
    let app = test_app().await;

    for event_id in ["alert-100", "alert-200"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/tickets",
                json!({"event_id": event_id, "client_email": "c@x.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(get("/api/tickets/search?q=alert-100"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_analyst_crud() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/analysts",
            json!({"level": "L1", "email": "alice@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app.clone().oneshot(get("/api/analysts")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(get("/api/analysts/by-level/L1"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let update = Request::builder()
        .method("PUT")
        .uri(format!("/api/analysts/{id}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"level": "L2", "email": "alice@example.com"}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(update).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/analysts/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let delete_again = Request::builder()
        .method("DELETE")
        .uri(format!("/api/analysts/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(delete_again).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_analyst_requires_valid_email() {
    let app = test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/analysts",
            json!({"level": "L1", "email": "not-an-email"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

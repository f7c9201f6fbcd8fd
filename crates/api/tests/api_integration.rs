//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, Arc<api::InMemoryAppState>) {
    let state = api::create_default_state();
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_conversation(app: &axum::Router, initial_query: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "workflowId": "wf-1",
        "sessionId": "s-1",
        "userId": "u-1"
    });
    if let Some(query) = initial_query {
        body["initialQuery"] = serde_json::json!(query);
    }
    let (status, json) = send(app, "POST", "/conversations", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    json
}

#[tokio::test]
async fn health_check() {
    let (app, _) = setup();
    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let (app, _) = setup();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_conversation_starts_at_version_one() {
    let (app, _) = setup();
    let conversation = create_conversation(&app, None).await;
    assert_eq!(conversation["version"], 1);
    assert_eq!(conversation["userId"], "u-1");
    assert!(conversation["interactions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn initial_query_seeds_first_interaction() {
    let (app, _) = setup();
    let conversation = create_conversation(&app, Some("What is X?")).await;

    let stubs = conversation["interactions"].as_array().unwrap();
    assert_eq!(stubs.len(), 1);
    assert_eq!(stubs[0]["query"], "What is X?");
    // empty answer is omitted from the wire form
    assert!(stubs[0].get("answer").is_none());

    let id = conversation["id"].as_str().unwrap();
    let (status, listed) = send(&app, "GET", &format!("/conversations/{id}/interactions"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn get_unknown_conversation_is_404() {
    let (app, _) = setup();
    let (status, _) = send(
        &app,
        "GET",
        &format!("/conversations/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_id_is_400() {
    let (app, _) = setup();
    let (status, _) = send(&app, "GET", "/conversations/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_conversations_by_user() {
    let (app, _) = setup();
    create_conversation(&app, None).await;
    create_conversation(&app, None).await;

    let (status, json) = send(&app, "GET", "/conversations?userId=u-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (_, empty) = send(&app, "GET", "/conversations?userId=other", None).await;
    assert!(empty.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn stale_update_is_409_and_history_records_prior_state() {
    let (app, _) = setup();
    let conversation = create_conversation(&app, None).await;
    let conversation_id = conversation["id"].as_str().unwrap();

    let (status, interaction) = send(
        &app,
        "POST",
        "/interactions",
        Some(serde_json::json!({
            "workflowId": "wf-1",
            "sessionId": "s-1",
            "conversationId": conversation_id,
            "query": "What is X?"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(interaction["version"], 1);
    let id = interaction["id"].as_str().unwrap();

    let update = |version: i64| {
        serde_json::json!({
            "type": "answer",
            "data": "X is Y",
            "actor": "agent-1",
            "action": "update",
            "version": version
        })
    };

    let (status, updated) = send(&app, "PATCH", &format!("/interactions/{id}"), Some(update(1))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["version"], 2);
    assert_eq!(updated["answer"], "X is Y");

    // second writer still claiming version 1
    let (status, _) = send(&app, "PATCH", &format!("/interactions/{id}"), Some(update(1))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, history) = send(&app, "GET", &format!("/interactions/{id}/history"), None).await;
    assert_eq!(status, StatusCode::OK);
    let records = history.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["version"], 1);
    assert_eq!(records[0]["query"], "What is X?");
    // the record snapshots the state before the answer landed
    assert!(records[0].get("answer").is_none());
    assert_eq!(records[0]["actor"], "agent-1");
}

#[tokio::test]
async fn delete_conversation_then_get_is_404() {
    let (app, _) = setup();
    let conversation = create_conversation(&app, None).await;
    let id = conversation["id"].as_str().unwrap();

    let (status, _) = send(&app, "DELETE", &format!("/conversations/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/conversations/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//! Validation of vault, widget, dashboard and trace requests.

mod common;

use axum::http::StatusCode;
use common::{offline_app, post_json_auth, put_json_auth, token_for};
use serde_json::json;

fn token() -> String {
    token_for(1, "member", Some(1))
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

#[tokio::test]
async fn vault_rejects_invalid_key() {
    let response = post_json_auth(
        offline_app(),
        "/api/v1/vault",
        json!({ "key": "has spaces", "value": "sk-test" }),
        &token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn vault_rejects_empty_value() {
    let response = post_json_auth(
        offline_app(),
        "/api/v1/vault",
        json!({ "key": "OPENAI_KEY", "value": "" }),
        &token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Widgets and dashboards
// ---------------------------------------------------------------------------

#[tokio::test]
async fn widget_rejects_unknown_type() {
    let response = post_json_auth(
        offline_app(),
        "/api/v1/widgets",
        json!({ "name": "Latency", "widget_type": "gauge" }),
        &token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn widget_config_must_be_an_object() {
    let response = post_json_auth(
        offline_app(),
        "/api/v1/widgets",
        json!({ "name": "Latency", "widget_type": "line_chart", "config": [1, 2] }),
        &token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_rejects_blank_name() {
    let response = post_json_auth(
        offline_app(),
        "/api/v1/dashboards",
        json!({ "name": "" }),
        &token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn placement_overflowing_the_grid_is_rejected() {
    let response = put_json_auth(
        offline_app(),
        "/api/v1/dashboards/1/widgets/2",
        json!({ "x": 8, "y": 0, "w": 6, "h": 2 }),
        &token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn placement_at_the_integer_limit_is_rejected() {
    let response = put_json_auth(
        offline_app(),
        "/api/v1/dashboards/1/widgets/2",
        json!({ "x": i32::MAX, "y": 0, "w": 1, "h": 1 }),
        &token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn placement_with_zero_height_is_rejected() {
    let response = put_json_auth(
        offline_app(),
        "/api/v1/dashboards/1/widgets/2",
        json!({ "x": 0, "y": 0, "w": 4, "h": 0 }),
        &token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Traces
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_trace_batch_is_rejected() {
    let response = post_json_auth(
        offline_app(),
        "/api/v1/traces",
        json!({ "spans": [] }),
        &token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn negative_span_duration_is_rejected() {
    let response = post_json_auth(
        offline_app(),
        "/api/v1/traces",
        json!({ "spans": [{
            "trace_id": "t-1",
            "span_id": "s-1",
            "timestamp": "2026-01-01T00:00:00Z",
            "service_name": "chat",
            "span_name": "llm.call",
            "duration_ms": -5.0
        }] }),
        &token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

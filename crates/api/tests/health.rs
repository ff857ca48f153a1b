//! Health endpoint and middleware stack tests.

mod common;

use axum::http::{Method, Request, StatusCode};
use common::{body_json, get, offline_app};
use tower::ServiceExt;

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let response = get(offline_app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
    assert!(json["version"].is_string());
    assert_eq!(json["providers_with_env_key"], serde_json::json!([]));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let response = get(offline_app(), "/api/v1/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let response = get(offline_app(), "/health").await;
    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .unwrap();
    // UUID v4, hyphenated.
    assert_eq!(request_id.len(), 36);
}

#[tokio::test]
async fn incoming_request_id_is_propagated() {
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "client-supplied-id")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = offline_app().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "client-supplied-id"
    );
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/rules")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = offline_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://localhost:5173"
    );
}

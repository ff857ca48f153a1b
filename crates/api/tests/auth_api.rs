//! Authentication surface: extractor rejections, registration validation
//! and logout.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, get, get_auth, offline_app, post_json, post_json_auth, token_for};
use serde_json::json;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_credentials_return_401() {
    let response = get(offline_app(), "/api/v1/rules").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_token_returns_401() {
    let response = get_auth(offline_app(), "/api/v1/auth/me", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_bearer_scheme_returns_401() {
    let request = Request::builder()
        .uri("/api/v1/auth/me")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = offline_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_another_secret_returns_401() {
    let other = llmscope_api::auth::jwt::JwtConfig {
        secret: "some-other-secret".to_string(),
        access_token_expiry_mins: 60,
    };
    let token = llmscope_api::auth::jwt::generate_access_token(1, "member", None, &other).unwrap();
    let response = get_auth(offline_app(), "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_cookie_is_accepted_like_a_bearer_token() {
    let token = token_for(1, "member", None);
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/logout")
        .header("cookie", format!("theme=dark; session={token}"))
        .body(Body::empty())
        .unwrap();
    let response = offline_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_rejects_invalid_email() {
    let response = post_json(
        offline_app(),
        "/api/v1/auth/register",
        json!({ "email": "not-an-email", "name": "Ada", "password": "correct-horse-battery" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_short_password() {
    let response = post_json(
        offline_app(),
        "/api/v1/auth/register",
        json!({ "email": "ada@example.com", "name": "Ada", "password": "short" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let token = token_for(1, "member", Some(3));
    let response = post_json_auth(offline_app(), "/api/v1/auth/logout", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = response
        .headers()
        .get("set-cookie")
        .expect("set-cookie header")
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("session=;"));
    assert!(cookie.contains("Max-Age=0"));
}

// ---------------------------------------------------------------------------
// Platform admin
// ---------------------------------------------------------------------------

#[tokio::test]
async fn members_cannot_reach_admin_routes() {
    let token = token_for(5, "member", None);
    let response = get_auth(offline_app(), "/api/v1/admin/users", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admins_cannot_change_their_own_access() {
    let token = token_for(5, "admin", None);
    let response = common::put_json_auth(
        offline_app(),
        "/api/v1/admin/users/5",
        json!({ "is_active": false }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_update_rejects_unknown_role() {
    let token = token_for(5, "admin", None);
    let response = common::put_json_auth(
        offline_app(),
        "/api/v1/admin/users/9",
        json!({ "role": "owner" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

//! End-to-end flows against a real database: register, create an
//! organisation, define rules, evaluate them and filter traces with them.
//!
//! Run with `DATABASE_URL` set and `cargo test -- --ignored`.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, delete_auth, get_auth, post_json, post_json_auth, put_json_auth,
};
use serde_json::json;
use sqlx::PgPool;

async fn register(pool: &PgPool, email: &str) -> (String, serde_json::Value) {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/auth/register",
        json!({ "email": email, "name": "Test User", "password": "correct-horse-battery" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let token = json["data"]["access_token"].as_str().unwrap().to_string();
    (token, json["data"]["user"].clone())
}

/// Create an organisation and return a token acting in it.
async fn org_token(pool: &PgPool, token: &str) -> (i64, String) {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/organisations",
        json!({ "name": "Acme" }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let org_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/organisations/{org_id}/switch"),
        json!({}),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let switched = body_json(response).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    (org_id, switched)
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn first_user_is_admin_and_second_is_member(pool: PgPool) {
    let (_, first) = register(&pool, "first@example.com").await;
    let (_, second) = register(&pool, "second@example.com").await;
    assert_eq!(first["role"], "admin");
    assert_eq!(second["role"], "member");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_email_conflicts(pool: PgPool) {
    register(&pool, "dup@example.com").await;
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/auth/register",
        json!({ "email": "dup@example.com", "name": "Again", "password": "correct-horse-battery" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn rule_matches_only_its_bound_entity(pool: PgPool) {
    let (token, _) = register(&pool, "rules@example.com").await;
    let (_, token) = org_token(&pool, &token).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/rules",
        json!({
            "name": "Pro tier in EU",
            "groups": [{
                "condition_operator": "AND",
                "conditions": [
                    { "field": "tier", "operator": "equals", "value": "pro" },
                    { "field": "region", "operator": "in", "value": ["eu", "uk"] }
                ]
            }],
            "entities": [{ "entity_type": "prompt", "entity_id": "42" }]
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let rule_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let evaluate = |fields: serde_json::Value, entity_id: &'static str| {
        let app = build_test_app(pool.clone());
        let token = token.clone();
        async move {
            let response = post_json_auth(
                app,
                "/api/v1/rules/evaluate",
                json!({ "entity_type": "prompt", "entity_id": entity_id, "fields": fields }),
                &token,
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            body_json(response).await["data"]["matched_rule_ids"].clone()
        }
    };

    assert_eq!(evaluate(json!({ "tier": "pro", "region": "uk" }), "42").await, json!([rule_id]));
    assert_eq!(evaluate(json!({ "tier": "free", "region": "uk" }), "42").await, json!([]));
    assert_eq!(evaluate(json!({ "tier": "pro", "region": "uk" }), "7").await, json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn rules_are_scoped_to_the_organisation(pool: PgPool) {
    let (owner, _) = register(&pool, "owner@example.com").await;
    let (_, owner) = org_token(&pool, &owner).await;
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/rules",
        json!({ "name": "Private" }),
        &owner,
    )
    .await;
    let rule_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let (outsider, _) = register(&pool, "outsider@example.com").await;
    let (_, outsider) = org_token(&pool, &outsider).await;
    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/rules/{rule_id}"),
        &outsider,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn deactivated_users_cannot_log_in(pool: PgPool) {
    let (admin, _) = register(&pool, "admin@example.com").await;
    let (_, member) = register(&pool, "member@example.com").await;
    let member_id = member["id"].as_i64().unwrap();

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/admin/users/{member_id}"),
        json!({ "is_active": false }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/auth/login",
        json!({ "email": "member@example.com", "password": "correct-horse-battery" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn prompt_entity_data_is_compiled_with_variables(pool: PgPool) {
    let (token, _) = register(&pool, "prompts@example.com").await;
    let (_, token) = org_token(&pool, &token).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/prompts",
        json!({ "name": "greeting", "prompt": "Hello {{ name }}, welcome to {{place}}" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let prompt_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/rules",
        json!({
            "name": "Pro greeting",
            "groups": [{ "conditions": [{ "field": "tier", "operator": "equals", "value": "pro" }] }],
            "entities": [{ "entity_type": "prompt", "entity_id": prompt_id.to_string() }]
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/rules/evaluate",
        json!({
            "entity_type": "prompt",
            "fields": { "tier": "pro" },
            "include_entity_data": true,
            "entity_inputs": { "variables": { "name": "Ada" } }
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let entity_data = json["data"]["entity_data"].as_array().unwrap();
    assert_eq!(entity_data.len(), 1);
    assert_eq!(entity_data[0]["entity_id"], prompt_id.to_string());
    let data = &entity_data[0]["data"];
    assert_eq!(data["prompt_id"], prompt_id);
    assert_eq!(data["version"], "1.0.0");
    assert_eq!(data["prompt"], "Hello Ada, welcome to {{place}}");
    assert_eq!(data["missing_variables"], json!(["place"]));
}

// ---------------------------------------------------------------------------
// Trace filtering agrees with evaluation
// ---------------------------------------------------------------------------

/// Create a rule from `conditions`, ingest one span per attribute map and
/// return the span ids the rule selects through `GET /rules/{id}/traces`
/// and through `POST /rules/evaluate`, both sorted.
async fn spans_matched_both_ways(
    pool: &PgPool,
    conditions: serde_json::Value,
    attributes: Vec<serde_json::Value>,
) -> (Vec<String>, Vec<String>) {
    let (token, _) = register(pool, "traces@example.com").await;
    let (_, token) = org_token(pool, &token).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/rules",
        json!({
            "name": "Trace filter",
            "groups": [{ "condition_operator": "AND", "conditions": conditions }],
            "entities": [{ "entity_type": "context", "entity_id": "ctx" }]
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let rule_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let spans: Vec<_> = attributes
        .iter()
        .enumerate()
        .map(|(i, attrs)| {
            json!({
                "trace_id": "t1",
                "span_id": format!("s{i}"),
                "timestamp": "2026-01-01T00:00:00Z",
                "service_name": "chat",
                "span_name": "completion",
                "attributes": attrs
            })
        })
        .collect();
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/traces",
        json!({ "spans": spans }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/rules/{rule_id}/traces?limit=100"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let mut by_sql: Vec<String> = body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["span_id"].as_str().unwrap().to_string())
        .collect();
    by_sql.sort();

    let mut by_evaluator = Vec::new();
    for (i, attrs) in attributes.iter().enumerate() {
        let response = post_json_auth(
            build_test_app(pool.clone()),
            "/api/v1/rules/evaluate",
            json!({ "entity_type": "context", "entity_id": "ctx", "fields": attrs }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        if body_json(response).await["data"]["matched_rule_ids"] == json!([rule_id]) {
            by_evaluator.push(format!("s{i}"));
        }
    }
    by_evaluator.sort();

    (by_sql, by_evaluator)
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn rule_traces_apply_in_and_between(pool: PgPool) {
    let (by_sql, by_evaluator) = spans_matched_both_ways(
        &pool,
        json!([
            { "field": "provider", "operator": "in", "value": ["openai", "anthropic"] },
            { "field": "latency_ms", "operator": "between", "value": [100, 500], "data_type": "number" }
        ]),
        vec![
            json!({ "provider": "openai", "latency_ms": 250 }),
            json!({ "provider": "anthropic", "latency_ms": "+120" }),
            json!({ "provider": "openai", "latency_ms": 900 }),
            json!({ "provider": "mistral", "latency_ms": 200 }),
            json!({ "provider": "openai" }),
            json!({ "provider": "openai", "latency_ms": ".5" }),
        ],
    )
    .await;
    assert_eq!(by_sql, vec!["s0", "s1"]);
    assert_eq!(by_sql, by_evaluator);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn rule_traces_coerce_booleans_like_evaluation(pool: PgPool) {
    let (by_sql, by_evaluator) = spans_matched_both_ways(
        &pool,
        json!([{ "field": "stream", "operator": "equals", "value": "true", "data_type": "boolean" }]),
        vec![
            json!({ "stream": true }),
            json!({ "stream": 1 }),
            json!({ "stream": "1" }),
            json!({ "stream": " TRUE " }),
            json!({ "stream": false }),
            json!({ "stream": "yes" }),
            json!({ "stream": 2 }),
        ],
    )
    .await;
    assert_eq!(by_sql, vec!["s0", "s1", "s2", "s3"]);
    assert_eq!(by_sql, by_evaluator);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn rule_traces_parse_numbers_like_evaluation(pool: PgPool) {
    let (by_sql, by_evaluator) = spans_matched_both_ways(
        &pool,
        json!([{ "field": "score", "operator": "gt", "value": "0", "data_type": "number" }]),
        vec![
            json!({ "score": ".5" }),
            json!({ "score": "+5" }),
            json!({ "score": "5." }),
            json!({ "score": 3 }),
            json!({ "score": "abc" }),
            json!({ "score": "-1" }),
        ],
    )
    .await;
    assert_eq!(by_sql, vec!["s0", "s1", "s2", "s3"]);
    assert_eq!(by_sql, by_evaluator);
}

// ---------------------------------------------------------------------------
// Membership changes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn removed_member_cannot_write_with_an_old_token(pool: PgPool) {
    let (owner, _) = register(&pool, "owner@example.com").await;
    let (org_id, owner) = org_token(&pool, &owner).await;
    let (member, member_user) = register(&pool, "member@example.com").await;
    let member_id = member_user["id"].as_i64().unwrap();

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/organisations/{org_id}/members"),
        json!({ "email": "member@example.com" }),
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/organisations/{org_id}/switch"),
        json!({}),
        &member,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let member = body_json(response).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/organisations/{org_id}/members/{member_id}"),
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/rules",
        json!({ "name": "After removal" }),
        &member,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

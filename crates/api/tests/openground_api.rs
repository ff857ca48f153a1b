//! OpenGround request validation. Rejected runs never call a provider.

mod common;

use axum::http::StatusCode;
use common::{body_json, offline_app, post_json_auth, token_for};
use serde_json::{json, Value};

fn selection(provider: &str, model: &str) -> Value {
    json!({ "provider": provider, "model": model })
}

async fn run(body: Value) -> StatusCode {
    let token = token_for(1, "member", Some(1));
    post_json_auth(offline_app(), "/api/v1/openground", body, &token)
        .await
        .status()
}

#[tokio::test]
async fn no_providers_is_rejected() {
    let status = run(json!({
        "prompt_source": { "type": "custom", "prompt": "Hello" },
        "providers": []
    }))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn more_than_ten_providers_is_rejected() {
    let providers: Vec<Value> = (0..11).map(|_| selection("openai", "gpt-4o-mini")).collect();
    let token = token_for(1, "member", Some(1));
    let response = post_json_auth(
        offline_app(),
        "/api/v1/openground",
        json!({
            "prompt_source": { "type": "custom", "prompt": "Hello" },
            "providers": providers
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("At most 10"));
}

#[tokio::test]
async fn empty_custom_prompt_is_rejected() {
    let status = run(json!({
        "prompt_source": { "type": "custom", "prompt": "   " },
        "providers": [selection("anthropic", "claude-3-5-haiku-latest")]
    }))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_max_tokens_is_rejected() {
    let status = run(json!({
        "prompt_source": { "type": "custom", "prompt": "Hello" },
        "providers": [{
            "provider": "mistral",
            "model": "mistral-small-latest",
            "config": { "max_tokens": 0 }
        }]
    }))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blank_model_is_rejected() {
    let status = run(json!({
        "prompt_source": { "type": "custom", "prompt": "Hello" },
        "providers": [selection("groq", " ")]
    }))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_provider_fails_to_deserialize() {
    let status = run(json!({
        "prompt_source": { "type": "custom", "prompt": "Hello" },
        "providers": [selection("cohere", "command-r")]
    }))
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

//! Client for the Anthropic messages API.

use async_trait::async_trait;
use llmscope_core::openground::ProviderKind;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::provider::{ensure_success, ChatCompletion, ChatRequest, LlmProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const API_VERSION: &str = "2023-06-01";

/// `max_tokens` is mandatory on this API; used when the run does not set it.
pub const DEFAULT_MAX_TOKENS: i64 = 1024;

pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL.to_string(), api_key)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: i64,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: Option<i64>,
    output_tokens: Option<i64>,
}

fn into_completion(response: MessagesResponse) -> Result<ChatCompletion, ProviderError> {
    let texts: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();
    if texts.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "response has no text content".to_string(),
        ));
    }

    let (prompt_tokens, completion_tokens) = match response.usage {
        Some(u) => (u.input_tokens, u.output_tokens),
        None => (None, None),
    };
    let total_tokens = match (prompt_tokens, completion_tokens) {
        (Some(p), Some(c)) => p.checked_add(c),
        _ => None,
    };

    Ok(ChatCompletion {
        text: texts.concat(),
        prompt_tokens,
        completion_tokens,
        total_tokens,
    })
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, ProviderError> {
        let body = MessagesBody {
            model: &request.model,
            max_tokens: request.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.config.temperature,
            top_p: request.config.top_p,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let parsed = ensure_success(response)
            .await?
            .json::<MessagesResponse>()
            .await?;
        into_completion(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<ChatCompletion, ProviderError> {
        into_completion(serde_json::from_str(body).expect("valid json"))
    }

    #[test]
    fn joins_text_blocks_and_sums_usage() {
        let completion = parse(
            r#"{
                "id": "msg_1",
                "type": "message",
                "content": [
                    {"type": "text", "text": "Hello, "},
                    {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                    {"type": "text", "text": "world"}
                ],
                "usage": {"input_tokens": 9, "output_tokens": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(completion.text, "Hello, world");
        assert_eq!(completion.prompt_tokens, Some(9));
        assert_eq!(completion.completion_tokens, Some(2));
        assert_eq!(completion.total_tokens, Some(11));
    }

    #[test]
    fn no_text_is_invalid() {
        let err = parse(r#"{"content": [], "usage": {"input_tokens": 1, "output_tokens": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn body_always_carries_max_tokens() {
        let body = MessagesBody {
            model: "claude-3-5-haiku-latest",
            max_tokens: DEFAULT_MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: "hi",
            }],
            temperature: None,
            top_p: Some(0.9),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["top_p"], 0.9);
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn absurd_usage_leaves_total_empty() {
        let completion = parse(
            r#"{"content":[{"type":"text","text":"hi"}],
                "usage":{"input_tokens":9223372036854775807,"output_tokens":1}}"#,
        )
        .unwrap();
        assert_eq!(completion.completion_tokens, Some(1));
        assert_eq!(completion.total_tokens, None);
    }
}

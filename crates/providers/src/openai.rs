//! Client for the OpenAI chat-completions wire format, also spoken by
//! Mistral and Groq.

use async_trait::async_trait;
use llmscope_core::openground::ProviderKind;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::provider::{ensure_success, ChatCompletion, ChatRequest, LlmProvider};

/// Default API base URL for an OpenAI-compatible provider.
pub fn default_base_url(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Mistral => "https://api.mistral.ai/v1",
        ProviderKind::Groq => "https://api.groq.com/openai/v1",
        _ => "https://api.openai.com/v1",
    }
}

pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    kind: ProviderKind,
    base_url: String,
    api_key: String,
}

impl OpenAiCompatibleClient {
    pub fn new(client: reqwest::Client, kind: ProviderKind, api_key: String) -> Self {
        Self::with_base_url(client, kind, default_base_url(kind).to_string(), api_key)
    }

    pub fn with_base_url(
        client: reqwest::Client,
        kind: ProviderKind,
        base_url: String,
        api_key: String,
    ) -> Self {
        Self {
            client,
            kind,
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
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<i64>,
    completion_tokens: Option<i64>,
    total_tokens: Option<i64>,
}

fn into_completion(response: ChatResponse) -> Result<ChatCompletion, ProviderError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ProviderError::InvalidResponse("response has no choices".to_string()))?;

    let (prompt_tokens, completion_tokens, total_tokens) = match response.usage {
        Some(u) => {
            let total = u
                .total_tokens
                .or_else(|| u.prompt_tokens?.checked_add(u.completion_tokens?));
            (u.prompt_tokens, u.completion_tokens, total)
        }
        None => (None, None, None),
    };

    Ok(ChatCompletion {
        text,
        prompt_tokens,
        completion_tokens,
        total_tokens,
    })
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleClient {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, ProviderError> {
        let body = ChatBody {
            model: &request.model,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.config.temperature,
            max_tokens: request.config.max_tokens,
            top_p: request.config.top_p,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed = ensure_success(response)
            .await?
            .json::<ChatResponse>()
            .await?;
        into_completion(parsed)
    }
}

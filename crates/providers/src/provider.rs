use async_trait::async_trait;
use llmscope_core::openground::{ProviderConfig, ProviderKind};

use crate::error::ProviderError;

/// A single-turn chat request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub prompt: String,
    pub config: ProviderConfig,
}

/// Text and token usage of a completed call. Token counts are `None` when
/// the provider does not report them.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub text: String,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, ProviderError>;
}

/// Return the response if it has a success status, otherwise an
/// [`ProviderError::Api`] carrying the status and body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ProviderError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

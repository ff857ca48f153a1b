//! Builds provider clients over one shared HTTP client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use llmscope_core::openground::ProviderKind;

use crate::anthropic::AnthropicClient;
use crate::error::ProviderError;
use crate::openai::OpenAiCompatibleClient;
use crate::provider::LlmProvider;

/// Shared reqwest client plus the server-wide fallback API keys.
#[derive(Clone)]
pub struct ProviderRegistry {
    client: reqwest::Client,
    env_keys: HashMap<ProviderKind, String>,
}

impl ProviderRegistry {
    /// `timeout` is the only timeout a provider call has.
    pub fn new(
        timeout: Duration,
        env_keys: HashMap<ProviderKind, String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, env_keys })
    }

    /// Whether a server-wide key is configured for `kind`.
    pub fn has_env_key(&self, kind: ProviderKind) -> bool {
        self.env_keys.contains_key(&kind)
    }

    /// A client for `kind`, authenticated with `api_key` or, when absent,
    /// the server-wide key.
    pub fn client_for(
        &self,
        kind: ProviderKind,
        api_key: Option<String>,
    ) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let key = api_key
            .or_else(|| self.env_keys.get(&kind).cloned())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::MissingApiKey(format!(
                    "{} is not set and no api_key_secret was given",
                    kind.api_key_env()
                ))
            })?;

        let provider: Arc<dyn LlmProvider> = match kind {
            ProviderKind::Anthropic => Arc::new(AnthropicClient::new(self.client.clone(), key)),
            _ => Arc::new(OpenAiCompatibleClient::new(self.client.clone(), kind, key)),
        };
        Ok(provider)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut configured: Vec<&str> = self.env_keys.keys().map(|k| k.as_str()).collect();
        configured.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("configured", &configured)
            .finish()
    }
}

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::prompts::MAX_PROMPT_LENGTH;
use crate::types::DbId;
use crate::vault::validate_secret_key;

/// Maximum number of providers in one run.
pub const MAX_PROVIDERS: usize = 10;

/// Maximum length of a model identifier.
pub const MAX_MODEL_LENGTH: usize = 128;

/// Maximum `max_tokens` a run may request from a provider.
pub const MAX_COMPLETION_TOKENS: i64 = 32_768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Mistral,
    Groq,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [Self::OpenAi, Self::Anthropic, Self::Mistral, Self::Groq];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Mistral => "mistral",
            Self::Groq => "groq",
        }
    }

    /// Environment variable holding the server-wide key for this provider.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Mistral => "MISTRAL_API_KEY",
            Self::Groq => "GROQ_API_KEY",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown provider '{s}' (expected openai, anthropic, mistral or groq)"
                ))
            })
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling parameters passed through to the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(CoreError::Validation(format!(
                    "temperature must be between 0 and 2 (got {t})"
                )));
            }
        }
        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(CoreError::Validation(format!(
                    "top_p must be between 0 and 1 (got {p})"
                )));
            }
        }
        if let Some(m) = self.max_tokens {
            if !(1..=MAX_COMPLETION_TOKENS).contains(&m) {
                return Err(CoreError::Validation(format!(
                    "max_tokens must be between 1 and {MAX_COMPLETION_TOKENS} (got {m})"
                )));
            }
        }
        Ok(())
    }
}

/// One provider/model pair chosen for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSelection {
    pub provider: ProviderKind,
    pub model: String,
    #[serde(default)]
    pub config: ProviderConfig,
    /// Vault key holding the API key. Falls back to the provider's
    /// environment variable when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_secret: Option<String>,
}

/// Where the prompt text comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptSource {
    Custom {
        prompt: String,
    },
    PromptHub {
        prompt_id: DbId,
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        variables: HashMap<String, String>,
    },
}

impl PromptSource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Custom { .. } => "custom",
            Self::PromptHub { .. } => "prompt_hub",
        }
    }
}

/// Outcome of one provider call. Exactly one of `response` and `error` is
/// set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub provider: ProviderKind,
    pub model: String,
    pub config: ProviderConfig,
    pub response: Option<String>,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub cost: Option<f64>,
    pub response_time_ms: i64,
    pub error: Option<String>,
}

impl ProviderResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Validate the provider list and the prompt of a run.
pub fn validate_selections(selections: &[ProviderSelection]) -> Result<(), CoreError> {
    if selections.is_empty() {
        return Err(CoreError::Validation(
            "At least one provider must be selected".to_string(),
        ));
    }
    if selections.len() > MAX_PROVIDERS {
        return Err(CoreError::Validation(format!(
            "At most {MAX_PROVIDERS} providers may be selected (got {})",
            selections.len()
        )));
    }
    for (index, selection) in selections.iter().enumerate() {
        let model = selection.model.trim();
        if model.is_empty() || model.len() > MAX_MODEL_LENGTH {
            return Err(CoreError::Validation(format!(
                "providers[{index}].model must be 1 to {MAX_MODEL_LENGTH} characters"
            )));
        }
        selection.config.validate().map_err(|e| match e {
            CoreError::Validation(msg) => {
                CoreError::Validation(format!("providers[{index}].config: {msg}"))
            }
            other => other,
        })?;
        if let Some(secret) = &selection.api_key_secret {
            validate_secret_key(secret)?;
        }
    }
    Ok(())
}

/// Validate a custom prompt's text.
pub fn validate_custom_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation("prompt must not be empty".to_string()));
    }
    if prompt.chars().count() > MAX_PROMPT_LENGTH {
        return Err(CoreError::Validation(format!(
            "prompt exceeds maximum length of {MAX_PROMPT_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn selection(provider: ProviderKind, model: &str) -> ProviderSelection {
        ProviderSelection {
            provider,
            model: model.to_string(),
            config: ProviderConfig::default(),
            api_key_secret: None,
        }
    }

    #[test]
    fn provider_names_are_lowercase() {
        assert_eq!(serde_json::to_value(ProviderKind::OpenAi).unwrap(), json!("openai"));
        assert_eq!("groq".parse::<ProviderKind>().unwrap(), ProviderKind::Groq);
        assert!("cohere".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn prompt_source_is_tagged_by_type() {
        let custom: PromptSource =
            serde_json::from_value(json!({"type": "custom", "prompt": "hi"})).unwrap();
        assert_eq!(custom.kind(), "custom");

        let hub: PromptSource = serde_json::from_value(json!({
            "type": "prompt_hub", "prompt_id": 4, "variables": {"name": "Ada"}
        }))
        .unwrap();
        assert_matches!(hub, PromptSource::PromptHub { prompt_id: 4, version: None, .. });
    }

    #[test]
    fn selection_count_is_bounded() {
        assert!(validate_selections(&[]).is_err());
        let many = vec![selection(ProviderKind::OpenAi, "gpt-4o"); MAX_PROVIDERS + 1];
        assert!(validate_selections(&many).is_err());
        let max = vec![selection(ProviderKind::OpenAi, "gpt-4o"); MAX_PROVIDERS];
        assert!(validate_selections(&max).is_ok());
    }

    #[test]
    fn blank_model_rejected() {
        assert!(validate_selections(&[selection(ProviderKind::Groq, "  ")]).is_err());
    }

    #[test]
    fn config_ranges_checked() {
        let mut s = selection(ProviderKind::Anthropic, "claude-3-5-sonnet");
        s.config.temperature = Some(2.5);
        assert_matches!(validate_selections(&[s.clone()]), Err(CoreError::Validation(msg)) if msg.contains("providers[0]"));
        s.config.temperature = Some(0.7);
        s.config.max_tokens = Some(0);
        assert!(validate_selections(&[s]).is_err());
    }

    #[test]
    fn api_key_secret_must_be_a_valid_key() {
        let mut s = selection(ProviderKind::Mistral, "mistral-large-latest");
        s.api_key_secret = Some("bad key".into());
        assert!(validate_selections(&[s]).is_err());
    }

    #[test]
    fn custom_prompt_checks() {
        assert!(validate_custom_prompt("").is_err());
        assert!(validate_custom_prompt("Explain monads").is_ok());
    }
}

//! Built-in per-model prices, in USD per million tokens.

use super::model::ProviderKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPrice {
    pub fn cost(&self, prompt_tokens: i64, completion_tokens: i64) -> f64 {
        (prompt_tokens.max(0) as f64 * self.input_per_million
            + completion_tokens.max(0) as f64 * self.output_per_million)
            / 1_000_000.0
    }
}

const fn price(input_per_million: f64, output_per_million: f64) -> ModelPrice {
    ModelPrice {
        input_per_million,
        output_per_million,
    }
}

/// Model name prefixes and their prices. Dated or suffixed model ids
/// (`gpt-4o-2024-08-06`) resolve to the longest matching prefix.
const PRICES: &[(ProviderKind, &str, ModelPrice)] = &[
    (ProviderKind::OpenAi, "gpt-4o-mini", price(0.15, 0.60)),
    (ProviderKind::OpenAi, "gpt-4o", price(2.50, 10.00)),
    (ProviderKind::OpenAi, "gpt-4.1-nano", price(0.10, 0.40)),
    (ProviderKind::OpenAi, "gpt-4.1-mini", price(0.40, 1.60)),
    (ProviderKind::OpenAi, "gpt-4.1", price(2.00, 8.00)),
    (ProviderKind::OpenAi, "gpt-4-turbo", price(10.00, 30.00)),
    (ProviderKind::OpenAi, "gpt-4", price(30.00, 60.00)),
    (ProviderKind::OpenAi, "gpt-3.5-turbo", price(0.50, 1.50)),
    (ProviderKind::OpenAi, "o1-mini", price(1.10, 4.40)),
    (ProviderKind::OpenAi, "o1", price(15.00, 60.00)),
    (ProviderKind::OpenAi, "o3-mini", price(1.10, 4.40)),
    (ProviderKind::Anthropic, "claude-3-5-sonnet", price(3.00, 15.00)),
    (ProviderKind::Anthropic, "claude-3-7-sonnet", price(3.00, 15.00)),
    (ProviderKind::Anthropic, "claude-3-5-haiku", price(0.80, 4.00)),
    (ProviderKind::Anthropic, "claude-3-haiku", price(0.25, 1.25)),
    (ProviderKind::Anthropic, "claude-3-opus", price(15.00, 75.00)),
    (ProviderKind::Mistral, "mistral-large", price(2.00, 6.00)),
    (ProviderKind::Mistral, "mistral-small", price(0.20, 0.60)),
    (ProviderKind::Mistral, "open-mistral-nemo", price(0.15, 0.15)),
    (ProviderKind::Mistral, "codestral", price(0.30, 0.90)),
    (ProviderKind::Groq, "llama-3.3-70b", price(0.59, 0.79)),
    (ProviderKind::Groq, "llama-3.1-8b", price(0.05, 0.08)),
    (ProviderKind::Groq, "mixtral-8x7b", price(0.24, 0.24)),
    (ProviderKind::Groq, "gemma2-9b", price(0.20, 0.20)),
];

/// Look up the price of `model` on `provider`.
pub fn price_for(provider: ProviderKind, model: &str) -> Option<ModelPrice> {
    PRICES
        .iter()
        .filter(|(p, prefix, _)| *p == provider && model.starts_with(prefix))
        .max_by_key(|(_, prefix, _)| prefix.len())
        .map(|(_, _, price)| *price)
}

/// Cost of a call in USD. Unknown models cost 0.
pub fn estimate_cost(
    provider: ProviderKind,
    model: &str,
    prompt_tokens: i64,
    completion_tokens: i64,
) -> f64 {
    match price_for(provider, model) {
        Some(price) => price.cost(prompt_tokens, completion_tokens),
        None => {
            tracing::warn!(provider = %provider, model, "No price for model, cost recorded as 0");
            0.0
        }
    }
}

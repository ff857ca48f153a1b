//! OpenGround fan-out: one prompt, many providers, concurrently.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use llmscope_core::openground::{
    estimate_cost, summarize, EvaluationStats, ProviderResult, ProviderSelection,
};

use crate::error::ProviderError;
use crate::provider::{ChatRequest, LlmProvider};

/// A selection with its resolved client. A client that could not be built
/// (for example a missing API key) is reported on that slot only.
pub struct ProviderTarget {
    pub selection: ProviderSelection,
    pub client: Result<Arc<dyn LlmProvider>, ProviderError>,
}

/// Call every target concurrently and return one result per target, in
/// input order, plus the run's stats.
///
/// A failing provider never affects the others.
pub async fn run_evaluation(
    prompt: &str,
    targets: Vec<ProviderTarget>,
) -> (Vec<ProviderResult>, EvaluationStats) {
    let calls = targets
        .into_iter()
        .map(|target| call_provider(prompt, target));
    let results = join_all(calls).await;
    let stats = summarize(&results);
    (results, stats)
}

async fn call_provider(prompt: &str, target: ProviderTarget) -> ProviderResult {
    let ProviderTarget { selection, client } = target;
    let started = Instant::now();

    let outcome = match client {
        Ok(client) => {
            let request = ChatRequest {
                model: selection.model.clone(),
                prompt: prompt.to_string(),
                config: selection.config.clone(),
            };
            client.complete(&request).await
        }
        Err(e) => Err(e),
    };
    let response_time_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

    match outcome {
        Ok(completion) => {
            let cost = estimate_cost(
                selection.provider,
                &selection.model,
                completion.prompt_tokens.unwrap_or(0),
                completion.completion_tokens.unwrap_or(0),
            );
            tracing::debug!(
                provider = %selection.provider,
                model = %selection.model,
                response_time_ms,
                "Provider call completed"
            );
            ProviderResult {
                provider: selection.provider,
                model: selection.model,
                config: selection.config,
                response: Some(completion.text),
                prompt_tokens: completion.prompt_tokens,
                completion_tokens: completion.completion_tokens,
                total_tokens: completion.total_tokens,
                cost: Some(cost),
                response_time_ms,
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(
                provider = %selection.provider,
                model = %selection.model,
                error = %e,
                "Provider call failed"
            );
            ProviderResult {
                provider: selection.provider,
                model: selection.model,
                config: selection.config,
                response: None,
                prompt_tokens: None,
                completion_tokens: None,
                total_tokens: None,
                cost: None,
                response_time_ms,
                error: Some(e.to_string()),
            }
        }
    }
}

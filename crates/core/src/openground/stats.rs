//! Aggregate statistics over one OpenGround run.

use serde::{Deserialize, Serialize};

use super::model::{ProviderKind, ProviderResult};

/// A failed provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: ProviderKind,
    pub model: String,
    pub error: String,
}

/// The provider holding the best value of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetric<T> {
    pub provider: ProviderKind,
    pub model: String,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationStats {
    pub total_providers: usize,
    pub errors: Vec<ProviderFailure>,
    pub min_cost: Option<ProviderMetric<f64>>,
    pub min_response_time: Option<ProviderMetric<i64>>,
    pub min_completion_tokens: Option<ProviderMetric<i64>>,
}

/// Reduce a run's results to its stats.
///
/// Minimums consider successful results only and use a strict `<` scan, so
/// a tie goes to the result that came first.
pub fn summarize(results: &[ProviderResult]) -> EvaluationStats {
    let errors = results
        .iter()
        .filter_map(|r| {
            r.error.as_ref().map(|error| ProviderFailure {
                provider: r.provider,
                model: r.model.clone(),
                error: error.clone(),
            })
        })
        .collect();

    EvaluationStats {
        total_providers: results.len(),
        errors,
        min_cost: minimum(results, |r| r.cost),
        min_response_time: minimum(results, |r| Some(r.response_time_ms)),
        min_completion_tokens: minimum(results, |r| r.completion_tokens),
    }
}

fn minimum<T: PartialOrd + Copy>(
    results: &[ProviderResult],
    metric: impl Fn(&ProviderResult) -> Option<T>,
) -> Option<ProviderMetric<T>> {
    let mut best: Option<(&ProviderResult, T)> = None;
    for result in results.iter().filter(|r| r.is_success()) {
        let Some(value) = metric(result) else {
            continue;
        };
        if best.map_or(true, |(_, current)| value < current) {
            best = Some((result, value));
        }
    }
    best.map(|(result, value)| ProviderMetric {
        provider: result.provider,
        model: result.model.clone(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openground::model::ProviderConfig;

    fn ok(provider: ProviderKind, model: &str, cost: f64, ms: i64, tokens: i64) -> ProviderResult {
        ProviderResult {
            provider,
            model: model.to_string(),
            config: ProviderConfig::default(),
            response: Some("answer".into()),
            prompt_tokens: Some(10),
            completion_tokens: Some(tokens),
            total_tokens: Some(10 + tokens),
            cost: Some(cost),
            response_time_ms: ms,
            error: None,
        }
    }

    fn failed(provider: ProviderKind, model: &str, ms: i64) -> ProviderResult {
        ProviderResult {
            provider,
            model: model.to_string(),
            config: ProviderConfig::default(),
            response: None,
            prompt_tokens: None,
            completion_tokens: None,
            total_tokens: None,
            cost: None,
            response_time_ms: ms,
            error: Some("boom".into()),
        }
    }

    #[test]
    fn minimums_pick_smallest_successful_value() {
        let stats = summarize(&[
            ok(ProviderKind::OpenAi, "gpt-4o", 0.02, 900, 120),
            ok(ProviderKind::Groq, "llama-3.1-8b", 0.001, 300, 150),
            ok(ProviderKind::Anthropic, "claude-3-5-haiku", 0.005, 600, 80),
        ]);
        assert_eq!(stats.total_providers, 3);
        assert!(stats.errors.is_empty());
        assert_eq!(stats.min_cost.unwrap().provider, ProviderKind::Groq);
        assert_eq!(stats.min_response_time.unwrap().value, 300);
        assert_eq!(stats.min_completion_tokens.unwrap().provider, ProviderKind::Anthropic);
    }

    #[test]
    fn ties_go_to_first_in_input_order() {
        let stats = summarize(&[
            ok(ProviderKind::Mistral, "mistral-small", 0.01, 500, 100),
            ok(ProviderKind::OpenAi, "gpt-4o-mini", 0.01, 500, 100),
        ]);
        assert_eq!(stats.min_cost.unwrap().provider, ProviderKind::Mistral);
        assert_eq!(stats.min_response_time.unwrap().provider, ProviderKind::Mistral);
        assert_eq!(stats.min_completion_tokens.unwrap().provider, ProviderKind::Mistral);
    }

    #[test]
    fn failures_are_listed_and_excluded_from_minimums() {
        let stats = summarize(&[
            failed(ProviderKind::OpenAi, "gpt-4o", 5),
            ok(ProviderKind::Groq, "llama-3.3-70b", 0.3, 700, 90),
            failed(ProviderKind::Anthropic, "claude-3-opus", 1),
        ]);
        assert_eq!(stats.total_providers, 3);
        assert_eq!(stats.errors.len(), 2);
        assert_eq!(stats.errors[0].provider, ProviderKind::OpenAi);
        assert_eq!(stats.errors[1].provider, ProviderKind::Anthropic);
        // The failed calls were faster but do not count.
        assert_eq!(stats.min_response_time.unwrap().value, 700);
    }

    #[test]
    fn all_failed_leaves_minimums_empty() {
        let stats = summarize(&[
            failed(ProviderKind::OpenAi, "gpt-4o", 5),
            failed(ProviderKind::Groq, "gemma2-9b", 6),
        ]);
        assert_eq!(stats.errors.len(), 2);
        assert!(stats.min_cost.is_none());
        assert!(stats.min_response_time.is_none());
        assert!(stats.min_completion_tokens.is_none());
    }

    #[test]
    fn n_results_k_failures() {
        for n in 1..=6usize {
            for k in 0..=n {
                let results: Vec<ProviderResult> = (0..n)
                    .map(|i| {
                        if i < k {
                            failed(ProviderKind::OpenAi, "gpt-4o", i as i64)
                        } else {
                            ok(ProviderKind::Groq, "gemma2-9b", 0.1, 100, 10)
                        }
                    })
                    .collect();
                let stats = summarize(&results);
                assert_eq!(stats.total_providers, n);
                assert_eq!(stats.errors.len(), k);
                assert_eq!(stats.min_cost.is_some(), k < n);
            }
        }
    }
}

//! OpenGround: one prompt, several LLM providers, compared side by side.
//!
//! This module holds the request/result model, the price table and the
//! stats reducer. The concurrent fan-out lives in `llmscope-providers`.

pub mod model;
pub mod pricing;
pub mod stats;

pub use model::{
    validate_custom_prompt, validate_selections, PromptSource, ProviderConfig, ProviderKind, ProviderResult,
    ProviderSelection, MAX_PROVIDERS,
};
pub use pricing::{estimate_cost, price_for, ModelPrice};
pub use stats::{summarize, EvaluationStats, ProviderFailure, ProviderMetric};

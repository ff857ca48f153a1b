//! LLM provider clients and the OpenGround fan-out.
//!
//! Every provider sits behind [`LlmProvider`]. OpenAI, Mistral and Groq
//! share the chat-completions wire format ([`openai`]); Anthropic uses the
//! messages API ([`anthropic`]). [`orchestrator::run_evaluation`] calls a
//! set of providers concurrently and reduces the results to stats.

pub mod anthropic;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod provider;
pub mod registry;

pub use error::ProviderError;
pub use orchestrator::{run_evaluation, ProviderTarget};
pub use provider::{ChatCompletion, ChatRequest, LlmProvider};
pub use registry::ProviderRegistry;

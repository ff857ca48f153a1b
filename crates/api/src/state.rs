use std::sync::Arc;

use llmscope_core::vault::SecretCipher;
use llmscope_providers::ProviderRegistry;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool, cipher and registry are reference counted
/// internally.
#[derive(Clone)]
pub struct AppState {
    pub pool: llmscope_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Vault cipher built from `VAULT_ENCRYPTION_KEY`.
    pub cipher: SecretCipher,
    /// LLM provider clients over a shared HTTP client.
    pub providers: ProviderRegistry,
}

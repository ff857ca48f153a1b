use std::collections::HashMap;

use llmscope_core::openground::ProviderKind;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`). Longer than the
    /// provider timeout so an OpenGround run can finish.
    pub request_timeout_secs: u64,
    /// Time allowed for in-flight requests to drain on shutdown.
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Base64 of the 32-byte AES-256-GCM vault key.
    pub vault_encryption_key: String,
    /// Timeout of each LLM provider call (default: `90`).
    pub provider_timeout_secs: u64,
    /// Server-wide provider keys from `OPENAI_API_KEY` and friends.
    pub provider_keys: HashMap<ProviderKind, String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `120`                      |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `VAULT_ENCRYPTION_KEY`  | required                   |
    /// | `PROVIDER_TIMEOUT_SECS` | `90`                       |
    ///
    /// # Panics
    ///
    /// Panics on a malformed number or a missing required variable.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env_u64("REQUEST_TIMEOUT_SECS", 120);
        let shutdown_timeout_secs = env_u64("SHUTDOWN_TIMEOUT_SECS", 30);
        let provider_timeout_secs = env_u64("PROVIDER_TIMEOUT_SECS", 90);

        let vault_encryption_key = std::env::var("VAULT_ENCRYPTION_KEY")
            .expect("VAULT_ENCRYPTION_KEY must be set in the environment");

        let provider_keys = ProviderKind::ALL
            .into_iter()
            .filter_map(|kind| {
                std::env::var(kind.api_key_env())
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (kind, v))
            })
            .collect();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            vault_encryption_key,
            provider_timeout_secs,
            provider_keys,
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid u64")),
        Err(_) => default,
    }
}

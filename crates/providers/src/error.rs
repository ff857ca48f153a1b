/// Errors from a single provider call.
///
/// These never fail an OpenGround run; the orchestrator records the
/// message on the provider's result slot.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// No usable key in the vault or the environment.
    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    /// The response body did not have the expected shape.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

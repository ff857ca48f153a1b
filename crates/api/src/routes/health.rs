use axum::extract::State;
use axum::{routing::get, Json, Router};
use llmscope_core::openground::ProviderKind;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the database answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Providers with a server-wide API key. Others need a vault secret.
    pub providers_with_env_key: Vec<ProviderKind>,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = llmscope_db::health_check(&state.pool).await.is_ok();
    let providers_with_env_key = ProviderKind::ALL
        .into_iter()
        .filter(|kind| state.providers.has_env_key(*kind))
        .collect();

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        providers_with_env_key,
    })
}

/// Mounted at the root, not under `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

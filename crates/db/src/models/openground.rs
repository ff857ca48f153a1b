//! OpenGround run and per-provider result rows.

use llmscope_core::openground::{PromptSource, ProviderSelection};
use llmscope_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `openground_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OpengroundRequest {
    pub id: DbId,
    pub org_id: Option<DbId>,
    pub prompt_source: String,
    pub prompt: String,
    pub prompt_id: Option<DbId>,
    pub prompt_version: Option<String>,
    pub variables: serde_json::Value,
    pub stats: serde_json::Value,
    pub total_providers: i32,
    pub error_count: i32,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// A row from the `openground_provider_results` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProviderResultRow {
    pub id: DbId,
    pub request_id: DbId,
    pub position: i32,
    pub provider: String,
    pub model: String,
    pub config: serde_json::Value,
    pub response: Option<String>,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub cost: Option<f64>,
    pub response_time_ms: i64,
    pub error: Option<String>,
    pub created_at: Timestamp,
}

/// A run with its results in input order.
#[derive(Debug, Clone, Serialize)]
pub struct OpengroundRun {
    #[serde(flatten)]
    pub request: OpengroundRequest,
    pub results: Vec<ProviderResultRow>,
}

/// Body of `POST /openground`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunOpenground {
    pub prompt_source: PromptSource,
    pub providers: Vec<ProviderSelection>,
}

/// Resolved request header, ready to insert.
#[derive(Debug, Clone)]
pub struct NewOpengroundRequest<'a> {
    pub org_id: Option<DbId>,
    pub prompt_source: &'a str,
    pub prompt: &'a str,
    pub prompt_id: Option<DbId>,
    pub prompt_version: Option<&'a str>,
    pub variables: serde_json::Value,
    pub stats: serde_json::Value,
    pub total_providers: i32,
    pub error_count: i32,
    pub created_by: DbId,
}

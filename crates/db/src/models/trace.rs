//! Trace spans stored for analysis.

use llmscope_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maximum spans accepted in one ingest batch.
pub const MAX_TRACE_BATCH: usize = 1000;

/// A row from the `traces` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Trace {
    pub id: DbId,
    pub org_id: Option<DbId>,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub timestamp: Timestamp,
    pub service_name: String,
    pub span_name: String,
    pub duration_ms: f64,
    pub status_code: String,
    pub attributes: serde_json::Value,
    pub created_at: Timestamp,
}

/// One span in an ingest batch.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrace {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub timestamp: Timestamp,
    pub service_name: String,
    pub span_name: String,
    #[serde(default)]
    pub duration_ms: f64,
    pub status_code: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTraceBatch {
    pub spans: Vec<CreateTrace>,
}

/// Query parameters for listing traces.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceListParams {
    pub trace_id: Option<String>,
    pub service_name: Option<String>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

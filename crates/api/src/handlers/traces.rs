//! Handlers for trace ingestion and listing.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use llmscope_core::error::CoreError;
use llmscope_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use llmscope_db::models::trace::{CreateTrace, CreateTraceBatch, TraceListParams, MAX_TRACE_BATCH};
use llmscope_db::repositories::TraceRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub inserted: u64,
}

/// Reject empty or oversized batches and spans missing identifiers.
fn validate_batch(spans: &[CreateTrace]) -> Result<(), CoreError> {
    if spans.is_empty() {
        return Err(CoreError::Validation("spans must not be empty".into()));
    }
    if spans.len() > MAX_TRACE_BATCH {
        return Err(CoreError::Validation(format!(
            "A batch may contain at most {MAX_TRACE_BATCH} spans (got {})",
            spans.len()
        )));
    }
    for (index, span) in spans.iter().enumerate() {
        if span.trace_id.trim().is_empty() || span.span_id.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "spans[{index}] must have a trace_id and a span_id"
            )));
        }
        if span.duration_ms < 0.0 || !span.duration_ms.is_finite() {
            return Err(CoreError::Validation(format!(
                "spans[{index}].duration_ms must be a non-negative number"
            )));
        }
    }
    Ok(())
}

/// POST /api/v1/traces
///
/// Store a batch of spans in one transaction.
pub async fn ingest_traces(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTraceBatch>,
) -> AppResult<impl IntoResponse> {
    validate_batch(&input.spans)?;
    auth.ensure_member(&state).await?;
    let inserted = TraceRepo::insert_batch(&state.pool, auth.org_id, &input.spans).await?;

    tracing::info!(inserted, org_id = ?auth.org_id, "Traces ingested");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: IngestResponse { inserted },
        }),
    ))
}

/// GET /api/v1/traces?trace_id=&service_name=&from=&to=&limit=&offset=
pub async fn list_traces(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TraceListParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);
    let traces = TraceRepo::list(&state.pool, auth.org_id, &params, limit, offset).await?;
    Ok(Json(DataResponse { data: traces }))
}

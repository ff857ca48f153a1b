//! Route definitions for `/traces`.

use axum::routing::get;
use axum::Router;

use crate::handlers::traces;
use crate::state::AppState;

/// ```text
/// GET, POST   /   -> list_traces, ingest_traces
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(traces::list_traces).post(traces::ingest_traces))
}

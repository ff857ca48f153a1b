//! Route definitions for `/openground`.

use axum::routing::get;
use axum::Router;

use crate::handlers::openground;
use crate::state::AppState;

/// ```text
/// GET, POST     /       -> list_runs, run_openground
/// GET, DELETE   /{id}   -> get_run, delete_run
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(openground::list_runs).post(openground::run_openground),
        )
        .route(
            "/{id}",
            get(openground::get_run).delete(openground::delete_run),
        )
}

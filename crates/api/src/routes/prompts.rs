//! Route definitions for `/prompts`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::prompts;
use crate::state::AppState;

/// ```text
/// GET, POST     /                  -> list_prompts, create_prompt
/// GET, DELETE   /{id}?version=     -> get_prompt, delete_prompt
/// GET, POST     /{id}/versions     -> list_versions, create_version
/// POST          /{id}/compile      -> compile_prompt
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(prompts::list_prompts).post(prompts::create_prompt))
        .route(
            "/{id}",
            get(prompts::get_prompt).delete(prompts::delete_prompt),
        )
        .route(
            "/{id}/versions",
            get(prompts::list_versions).post(prompts::create_version),
        )
        .route("/{id}/compile", post(prompts::compile_prompt))
}

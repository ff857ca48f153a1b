//! Route definitions for `/api-keys`.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::api_keys;
use crate::state::AppState;

/// ```text
/// GET, POST  /       -> list_api_keys, create_api_key
/// DELETE     /{id}   -> revoke_api_key
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route("/{id}", delete(api_keys::revoke_api_key))
}

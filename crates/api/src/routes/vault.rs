//! Route definitions for `/vault`.

use axum::routing::get;
use axum::Router;

use crate::handlers::vault;
use crate::state::AppState;

/// ```text
/// GET, POST          /       -> list_secrets, create_secret
/// GET, PUT, DELETE   /{id}   -> get_secret, update_secret, delete_secret
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(vault::list_secrets).post(vault::create_secret))
        .route(
            "/{id}",
            get(vault::get_secret)
                .put(vault::update_secret)
                .delete(vault::delete_secret),
        )
}

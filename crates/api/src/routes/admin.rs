//! Route definitions for `/admin`.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`. All require the platform `admin` role.
///
/// ```text
/// GET   /users        -> list_users
/// PUT   /users/{id}   -> update_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", put(admin::update_user))
}

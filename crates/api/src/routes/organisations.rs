//! Route definitions for `/organisations`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::organisations;
use crate::state::AppState;

/// ```text
/// GET, POST          /                          -> list, create
/// GET, PUT, DELETE   /{id}                      -> get, update, delete
/// GET, POST          /{id}/members              -> list_members, add_member
/// DELETE             /{id}/members/{user_id}    -> remove_member
/// POST               /{id}/switch               -> switch_organisation
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(organisations::list_organisations).post(organisations::create_organisation),
        )
        .route(
            "/{id}",
            get(organisations::get_organisation)
                .put(organisations::update_organisation)
                .delete(organisations::delete_organisation),
        )
        .route(
            "/{id}/members",
            get(organisations::list_members).post(organisations::add_member),
        )
        .route(
            "/{id}/members/{user_id}",
            delete(organisations::remove_member),
        )
        .route("/{id}/switch", post(organisations::switch_organisation))
}

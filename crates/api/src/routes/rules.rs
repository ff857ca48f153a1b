//! Route definitions for `/rules` and `/rule-entities`.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::rules;
use crate::state::AppState;

/// Routes mounted at `/rules`.
///
/// ```text
/// GET, POST          /                              -> list_rules, create_rule
/// POST               /evaluate                      -> evaluate
/// GET, PUT, DELETE   /{id}                          -> get_rule, update_rule, delete_rule
/// PUT                /{id}/conditions               -> replace_conditions
/// GET, POST          /{id}/entities                 -> list_rule_entities, add_rule_entity
/// DELETE             /{id}/entities/{entity_id}     -> remove_rule_entity
/// GET                /{id}/traces                   -> rule_traces
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(rules::list_rules).post(rules::create_rule))
        .route("/evaluate", post(rules::evaluate))
        .route(
            "/{id}",
            get(rules::get_rule)
                .put(rules::update_rule)
                .delete(rules::delete_rule),
        )
        .route("/{id}/conditions", put(rules::replace_conditions))
        .route(
            "/{id}/entities",
            get(rules::list_rule_entities).post(rules::add_rule_entity),
        )
        .route(
            "/{id}/entities/{entity_id}",
            delete(rules::remove_rule_entity),
        )
        .route("/{id}/traces", get(rules::rule_traces))
}

/// Routes mounted at `/rule-entities`.
///
/// ```text
/// GET /?entity_type=&entity_id=   -> search_rule_entities
/// ```
pub fn entities_router() -> Router<AppState> {
    Router::new().route("/", get(rules::search_rule_entities))
}

pub mod admin;
pub mod api_keys;
pub mod auth;
pub mod dashboards;
pub mod health;
pub mod openground;
pub mod organisations;
pub mod prompts;
pub mod rules;
pub mod traces;
pub mod vault;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every route except register and login requires authentication through
/// a bearer JWT, a bearer API key or the session cookie.
///
/// ```text
/// /auth/register                                 register (public)
/// /auth/login                                    login (public)
/// /auth/logout                                   clear session cookie
/// /auth/me                                       current user
///
/// /admin/users                                   list accounts (platform admin)
/// /admin/users/{id}                              change role, deactivate
///
/// /api-keys                                      list, create
/// /api-keys/{id}                                 revoke
///
/// /organisations                                 list, create
/// /organisations/{id}                            get, update, delete
/// /organisations/{id}/members                    list, add
/// /organisations/{id}/members/{user_id}          remove
/// /organisations/{id}/switch                     switch current organisation
///
/// /rules                                         list, create
/// /rules/evaluate                                evaluate active rules
/// /rules/{id}                                    get, update, delete
/// /rules/{id}/conditions                         replace groups/conditions
/// /rules/{id}/entities                           list, bind
/// /rules/{id}/entities/{entity_id}               unbind
/// /rules/{id}/traces                             traces matching the rule
/// /rule-entities                                 search bindings
///
/// /prompts                                       list, create
/// /prompts/{id}                                  get (?version=), delete
/// /prompts/{id}/versions                         list, create
/// /prompts/{id}/compile                          compile with variables
///
/// /vault                                         list, create
/// /vault/{id}                                    get (decrypted), update, delete
///
/// /dashboards                                    list, create
/// /dashboards/{id}                               get, update, delete
/// /dashboards/{id}/widgets/{widget_id}           place, remove
/// /widgets                                       list, create
/// /widgets/{id}                                  get, update, delete
///
/// /openground                                    list, run
/// /openground/{id}                               get, delete
///
/// /traces                                        list, ingest
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/api-keys", api_keys::router())
        .nest("/organisations", organisations::router())
        .nest("/rules", rules::router())
        .nest("/rule-entities", rules::entities_router())
        .nest("/prompts", prompts::router())
        .nest("/vault", vault::router())
        .nest("/dashboards", dashboards::router())
        .nest("/widgets", dashboards::widgets_router())
        .nest("/openground", openground::router())
        .nest("/traces", traces::router())
}

//! Route definitions for `/dashboards` and `/widgets`.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{dashboards, widgets};
use crate::state::AppState;

/// Routes mounted at `/dashboards`.
///
/// ```text
/// GET, POST          /                           -> list, create
/// GET, PUT, DELETE   /{id}                       -> get, update, delete
/// PUT, DELETE        /{id}/widgets/{widget_id}   -> place_widget, remove_widget
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(dashboards::list_dashboards).post(dashboards::create_dashboard),
        )
        .route(
            "/{id}",
            get(dashboards::get_dashboard)
                .put(dashboards::update_dashboard)
                .delete(dashboards::delete_dashboard),
        )
        .route(
            "/{id}/widgets/{widget_id}",
            put(dashboards::place_widget).delete(dashboards::remove_widget),
        )
}

/// Routes mounted at `/widgets`.
///
/// ```text
/// GET, POST          /       -> list, create
/// GET, PUT, DELETE   /{id}   -> get, update, delete
/// ```
pub fn widgets_router() -> Router<AppState> {
    Router::new()
        .route("/", get(widgets::list_widgets).post(widgets::create_widget))
        .route(
            "/{id}",
            get(widgets::get_widget)
                .put(widgets::update_widget)
                .delete(widgets::delete_widget),
        )
}

//! Handlers for dashboards and widget placement.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use llmscope_core::dashboards::validate_name;
use llmscope_core::types::DbId;
use llmscope_db::models::dashboard::{
    CreateDashboard, Dashboard, DashboardDetail, PlaceWidget, UpdateDashboard,
};
use llmscope_db::repositories::{DashboardRepo, WidgetRepo};

use crate::error::{not_found, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/dashboards
///
/// Creating a main dashboard demotes the previous one.
pub async fn create_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateDashboard>,
) -> AppResult<impl IntoResponse> {
    validate_name("Dashboard", &input.name)?;

    auth.ensure_member(&state).await?;
    let dashboard = DashboardRepo::create(
        &state.pool,
        auth.org_id,
        input.name.trim(),
        input.description.as_deref(),
        input.is_main,
        auth.user_id,
    )
    .await?;

    tracing::info!(
        dashboard_id = dashboard.id,
        is_main = dashboard.is_main,
        user_id = auth.user_id,
        "Dashboard created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: dashboard })))
}

/// GET /api/v1/dashboards
///
/// The main dashboard first, then by name.
pub async fn list_dashboards(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let dashboards = DashboardRepo::list(&state.pool, auth.org_id).await?;
    Ok(Json(DataResponse { data: dashboards }))
}

/// GET /api/v1/dashboards/{id}
///
/// The dashboard with its placed widgets in reading order.
pub async fn get_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let dashboard = find_dashboard(&state, id, auth.org_id).await?;
    let widgets = DashboardRepo::list_widgets(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: DashboardDetail { dashboard, widgets },
    }))
}

/// PUT /api/v1/dashboards/{id}
pub async fn update_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDashboard>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        validate_name("Dashboard", name)?;
    }

    auth.ensure_member(&state).await?;
    let dashboard = DashboardRepo::update(
        &state.pool,
        id,
        auth.org_id,
        input.name.as_deref().map(str::trim),
        input.description.as_deref(),
        input.is_main,
    )
    .await?
    .ok_or_else(|| not_found("Dashboard", id))?;

    tracing::info!(dashboard_id = id, user_id = auth.user_id, "Dashboard updated");
    Ok(Json(DataResponse { data: dashboard }))
}

/// DELETE /api/v1/dashboards/{id}
pub async fn delete_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    auth.ensure_member(&state).await?;
    if !DashboardRepo::delete(&state.pool, id, auth.org_id).await? {
        return Err(not_found("Dashboard", id));
    }
    tracing::info!(dashboard_id = id, user_id = auth.user_id, "Dashboard deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/dashboards/{id}/widgets/{widget_id}
///
/// Place a widget on the dashboard, or move it if already placed. The
/// widget must belong to the same organisation.
pub async fn place_widget(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, widget_id)): Path<(DbId, DbId)>,
    Json(placement): Json<PlaceWidget>,
) -> AppResult<impl IntoResponse> {
    placement.validate()?;

    auth.ensure_member(&state).await?;
    find_dashboard(&state, id, auth.org_id).await?;
    WidgetRepo::find_by_id(&state.pool, widget_id, auth.org_id)
        .await?
        .ok_or_else(|| not_found("Widget", widget_id))?;

    DashboardRepo::place_widget(&state.pool, id, widget_id, &placement).await?;
    let widgets = DashboardRepo::list_widgets(&state.pool, id).await?;

    tracing::info!(
        dashboard_id = id,
        widget_id,
        x = placement.x,
        y = placement.y,
        user_id = auth.user_id,
        "Widget placed",
    );
    Ok(Json(DataResponse { data: widgets }))
}

/// DELETE /api/v1/dashboards/{id}/widgets/{widget_id}
pub async fn remove_widget(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, widget_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    auth.ensure_member(&state).await?;
    find_dashboard(&state, id, auth.org_id).await?;
    if !DashboardRepo::remove_widget(&state.pool, id, widget_id).await? {
        return Err(not_found("Widget", widget_id));
    }
    tracing::info!(dashboard_id = id, widget_id, user_id = auth.user_id, "Widget removed");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_dashboard(state: &AppState, id: DbId, org_id: Option<DbId>) -> AppResult<Dashboard> {
    DashboardRepo::find_by_id(&state.pool, id, org_id)
        .await?
        .ok_or_else(|| not_found("Dashboard", id))
}

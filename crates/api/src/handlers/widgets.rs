//! Handlers for the widget library.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use llmscope_core::dashboards::{validate_name, WidgetType};
use llmscope_core::error::CoreError;
use llmscope_core::types::DbId;
use llmscope_db::models::dashboard::{CreateWidget, UpdateWidget};
use llmscope_db::repositories::WidgetRepo;

use crate::error::{not_found, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Widget configs are free-form but must be JSON objects.
fn validate_config(config: &serde_json::Value) -> Result<(), CoreError> {
    if !config.is_object() {
        return Err(CoreError::Validation("Widget config must be a JSON object".into()));
    }
    Ok(())
}

/// POST /api/v1/widgets
pub async fn create_widget(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateWidget>,
) -> AppResult<impl IntoResponse> {
    validate_name("Widget", &input.name)?;
    let widget_type: WidgetType = input.widget_type.parse()?;
    let config = input.config.unwrap_or_else(|| serde_json::json!({}));
    validate_config(&config)?;

    auth.ensure_member(&state).await?;
    let widget = WidgetRepo::create(
        &state.pool,
        auth.org_id,
        input.name.trim(),
        input.description.as_deref(),
        widget_type,
        &config,
        auth.user_id,
    )
    .await?;

    tracing::info!(widget_id = widget.id, user_id = auth.user_id, "Widget created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: widget })))
}

/// GET /api/v1/widgets
pub async fn list_widgets(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let widgets = WidgetRepo::list(&state.pool, auth.org_id).await?;
    Ok(Json(DataResponse { data: widgets }))
}

/// GET /api/v1/widgets/{id}
pub async fn get_widget(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let widget = WidgetRepo::find_by_id(&state.pool, id, auth.org_id)
        .await?
        .ok_or_else(|| not_found("Widget", id))?;
    Ok(Json(DataResponse { data: widget }))
}

/// PUT /api/v1/widgets/{id}
pub async fn update_widget(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWidget>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        validate_name("Widget", name)?;
    }
    let widget_type = input
        .widget_type
        .as_deref()
        .map(str::parse::<WidgetType>)
        .transpose()?;
    if let Some(config) = &input.config {
        validate_config(config)?;
    }

    auth.ensure_member(&state).await?;
    let widget = WidgetRepo::update(
        &state.pool,
        id,
        auth.org_id,
        input.name.as_deref().map(str::trim),
        input.description.as_deref(),
        widget_type,
        input.config.as_ref(),
    )
    .await?
    .ok_or_else(|| not_found("Widget", id))?;

    tracing::info!(widget_id = id, user_id = auth.user_id, "Widget updated");
    Ok(Json(DataResponse { data: widget }))
}

/// DELETE /api/v1/widgets/{id}
///
/// Also removes the widget from every dashboard.
pub async fn delete_widget(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    auth.ensure_member(&state).await?;
    if !WidgetRepo::delete(&state.pool, id, auth.org_id).await? {
        return Err(not_found("Widget", id));
    }
    tracing::info!(widget_id = id, user_id = auth.user_id, "Widget deleted");
    Ok(StatusCode::NO_CONTENT)
}

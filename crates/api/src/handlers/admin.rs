//! Platform administration: account listing and access control.
//!
//! Every handler requires the platform `admin` role.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use llmscope_core::error::CoreError;
use llmscope_core::types::DbId;
use llmscope_db::models::user::UpdateUserAccess;
use llmscope_db::repositories::UserRepo;

use crate::error::{not_found, AppError, AppResult};
use crate::middleware::rbac::{validate_platform_role, RequireAdmin};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/users
pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.resolve();
    let users = UserRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: users }))
}

/// PUT /api/v1/admin/users/{id}
///
/// Change another account's platform role or deactivate it. Deactivated
/// users cannot log in and their API keys stop working; issued tokens stay
/// valid until they expire.
pub async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserAccess>,
) -> AppResult<impl IntoResponse> {
    if id == admin.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Admins cannot change their own access".into(),
        )));
    }
    if let Some(role) = &input.role {
        validate_platform_role(role)?;
    }

    let user = UserRepo::update_access(&state.pool, id, input.role.as_deref(), input.is_active)
        .await?
        .ok_or_else(|| not_found("User", id))?;

    tracing::info!(
        target_user_id = id,
        role = %user.role,
        is_active = user.is_active,
        user_id = admin.user_id,
        "User access updated",
    );
    Ok(Json(DataResponse { data: user }))
}

//! Handlers for API key management.
//!
//! Keys belong to the caller and act in the organisation the caller was in
//! when the key was created. The plaintext key is returned only on
//! creation; listings expose the `key_prefix`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use llmscope_core::api_keys::{generate_api_key, validate_key_name};
use llmscope_core::types::DbId;
use llmscope_db::models::api_key::{ApiKeyCreatedResponse, CreateApiKey};
use llmscope_db::repositories::ApiKeyRepo;

use crate::error::{not_found, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/api-keys
pub async fn create_api_key(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateApiKey>,
) -> AppResult<impl IntoResponse> {
    validate_key_name(&input.name)?;

    auth.ensure_member(&state).await?;
    let generated = generate_api_key();
    let key = ApiKeyRepo::create(
        &state.pool,
        input.name.trim(),
        &generated.hash,
        &generated.prefix,
        auth.user_id,
        auth.org_id,
    )
    .await?;

    tracing::info!(
        api_key_id = key.id,
        key_prefix = %generated.prefix,
        user_id = auth.user_id,
        "API key created",
    );

    let response = ApiKeyCreatedResponse {
        id: key.id,
        name: key.name,
        key_prefix: generated.prefix,
        plaintext_key: generated.plaintext,
        org_id: key.org_id,
        created_at: key.created_at,
    };
    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// GET /api/v1/api-keys
pub async fn list_api_keys(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let keys = ApiKeyRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: keys }))
}

/// DELETE /api/v1/api-keys/{id}
///
/// Revoke a key. Revoked keys stay listed with `revoked_at` set.
pub async fn revoke_api_key(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ApiKeyRepo::revoke(&state.pool, id, auth.user_id).await? {
        return Err(not_found("ApiKey", id));
    }
    tracing::info!(api_key_id = id, user_id = auth.user_id, "API key revoked");
    Ok(StatusCode::NO_CONTENT)
}

//! Handlers for the secret vault.
//!
//! Values are encrypted with the state's [`SecretCipher`] before they reach
//! the database and decrypted only by `GET /vault/{id}`.
//!
//! [`SecretCipher`]: llmscope_core::vault::SecretCipher

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use llmscope_core::types::DbId;
use llmscope_core::vault::{validate_secret_key, validate_secret_value};
use llmscope_db::models::vault::{CreateSecret, RevealedSecret, UpdateSecret};
use llmscope_db::repositories::VaultRepo;

use crate::error::{not_found, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/vault
pub async fn create_secret(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSecret>,
) -> AppResult<impl IntoResponse> {
    validate_secret_key(&input.key)?;
    validate_secret_value(&input.value)?;

    let encrypted = state.cipher.encrypt(&input.value)?;
    auth.ensure_member(&state).await?;
    let secret = VaultRepo::create(
        &state.pool,
        auth.org_id,
        &input.key,
        &encrypted,
        input.description.as_deref(),
        auth.user_id,
    )
    .await?;

    tracing::info!(secret_id = secret.id, key = %secret.key, user_id = auth.user_id, "Secret stored");
    Ok((StatusCode::CREATED, Json(DataResponse { data: secret })))
}

/// GET /api/v1/vault
///
/// Keys and metadata only.
pub async fn list_secrets(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let secrets = VaultRepo::list(&state.pool, auth.org_id).await?;
    Ok(Json(DataResponse { data: secrets }))
}

/// GET /api/v1/vault/{id}
///
/// The secret with its decrypted value.
pub async fn get_secret(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let secret = VaultRepo::find_by_id(&state.pool, id, auth.org_id)
        .await?
        .ok_or_else(|| not_found("VaultSecret", id))?;
    let value = state.cipher.decrypt(&secret.encrypted_value)?;

    tracing::info!(secret_id = id, user_id = auth.user_id, "Secret revealed");
    Ok(Json(DataResponse {
        data: RevealedSecret { secret, value },
    }))
}

/// PUT /api/v1/vault/{id}
///
/// Replace the value and/or description. The key is immutable.
pub async fn update_secret(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSecret>,
) -> AppResult<impl IntoResponse> {
    let encrypted = match &input.value {
        Some(value) => {
            validate_secret_value(value)?;
            Some(state.cipher.encrypt(value)?)
        }
        None => None,
    };

    auth.ensure_member(&state).await?;
    let secret = VaultRepo::update(
        &state.pool,
        id,
        auth.org_id,
        encrypted.as_deref(),
        input.description.as_deref(),
    )
    .await?
    .ok_or_else(|| not_found("VaultSecret", id))?;

    tracing::info!(secret_id = id, user_id = auth.user_id, "Secret updated");
    Ok(Json(DataResponse { data: secret }))
}

/// DELETE /api/v1/vault/{id}
pub async fn delete_secret(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    auth.ensure_member(&state).await?;
    if !VaultRepo::delete(&state.pool, id, auth.org_id).await? {
        return Err(not_found("VaultSecret", id));
    }
    tracing::info!(secret_id = id, user_id = auth.user_id, "Secret deleted");
    Ok(StatusCode::NO_CONTENT)
}

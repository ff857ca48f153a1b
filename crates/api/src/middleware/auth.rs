//! Authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use llmscope_core::api_keys::{hash_api_key, is_api_key};
use llmscope_core::error::CoreError;
use llmscope_core::types::DbId;
use llmscope_db::repositories::{ApiKeyRepo, OrganisationRepo};

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Name of the cookie carrying a browser session's access token.
pub const SESSION_COOKIE: &str = "session";

/// The authenticated caller.
///
/// Resolved, in order, from `Authorization: Bearer <jwt>`,
/// `Authorization: Bearer lsk_...` (an API key) or the `session` cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    /// Platform role (`"admin"` or `"member"`).
    pub role: String,
    /// Organisation the request acts in. Scopes every resource lookup.
    pub org_id: Option<DbId>,
    /// Set when the caller authenticated with an API key.
    pub api_key_id: Option<DbId>,
}

impl AuthUser {
    /// Confirm the caller still belongs to the organisation the request acts
    /// in. The `org` claim is fixed when the token is issued, so handlers
    /// that write organisation data call this before writing. Callers with
    /// no organisation pass.
    pub async fn ensure_member(&self, state: &AppState) -> AppResult<()> {
        let Some(org_id) = self.org_id else {
            return Ok(());
        };
        match OrganisationRepo::member_role(&state.pool, org_id, self.user_id).await? {
            Some(_) => Ok(()),
            None => {
                tracing::warn!(user_id = self.user_id, org_id, "Write from a former member rejected");
                Err(AppError::Core(CoreError::Forbidden(
                    "You are no longer a member of this organisation".to_string(),
                )))
            }
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(header) = parts.headers.get(AUTHORIZATION) {
            let value = header.to_str().map_err(|_| unauthorized("Invalid Authorization header"))?;
            let token = value.strip_prefix("Bearer ").ok_or_else(|| {
                unauthorized("Invalid Authorization format. Expected: Bearer <token>")
            })?;
            let token = token.trim();
            if is_api_key(token) {
                return from_api_key(state, token).await;
            }
            return from_jwt(state, token);
        }

        match session_cookie(parts) {
            Some(token) => from_jwt(state, &token),
            None => Err(unauthorized("Missing Authorization header")),
        }
    }
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.to_string()))
}

fn from_jwt(state: &AppState, token: &str) -> AppResult<AuthUser> {
    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| unauthorized("Invalid or expired token"))?;
    Ok(AuthUser {
        user_id: claims.sub,
        role: claims.role,
        org_id: claims.org,
        api_key_id: None,
    })
}

async fn from_api_key(state: &AppState, key: &str) -> AppResult<AuthUser> {
    let identity = ApiKeyRepo::authenticate(&state.pool, &hash_api_key(key))
        .await?
        .ok_or_else(|| unauthorized("Invalid or revoked API key"))?;
    Ok(AuthUser {
        user_id: identity.user_id,
        role: identity.role,
        org_id: identity.org_id,
        api_key_id: Some(identity.key_id),
    })
}

/// Value of the session cookie, if the request carries one.
fn session_cookie(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value that stores `token` as the session.
pub fn session_cookie_header(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

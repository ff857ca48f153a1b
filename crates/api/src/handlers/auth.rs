//! Handlers for the `/auth` resource (register, login, logout, me).

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use llmscope_core::error::CoreError;
use llmscope_core::types::DbId;
use llmscope_db::models::user::{LoginRequest, RegisterUser, User};
use llmscope_db::repositories::{OrganisationRepo, UserRepo};
use serde::Serialize;
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{session_cookie_header, AuthUser};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Returned by register, login and organisation switch.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    /// Organisation the current token acts in.
    pub acting_org_id: Option<DbId>,
    pub via_api_key: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an account and sign it in. The first account becomes `admin`.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(AppError::BadRequest)?;

    let email = input.email.trim();
    if UserRepo::find_by_email(&state.pool, email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "An account with this email already exists".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let user = UserRepo::create(&state.pool, email, input.name.trim(), &password_hash).await?;

    tracing::info!(user_id = user.id, role = %user.role, "User registered");

    let (cookie, response) = issue_session(&state, user, None)?;
    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(DataResponse { data: response }),
    ))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. The token acts in the user's
/// current organisation.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(invalid());
    }

    UserRepo::record_login(&state.pool, user.id).await?;

    // Drop a current organisation the user has since been removed from.
    let org = match user.current_org_id {
        Some(org_id) => OrganisationRepo::member_role(&state.pool, org_id, user.id)
            .await?
            .map(|_| org_id),
        None => None,
    };

    tracing::info!(user_id = user.id, org_id = ?org, "User logged in");

    let (cookie, response) = issue_session(&state, user, org)?;
    Ok(([(SET_COOKIE, cookie)], Json(DataResponse { data: response })))
}

/// POST /api/v1/auth/logout
///
/// Clear the session cookie. Bearer tokens stay valid until they expire.
pub async fn logout(_auth: AuthUser) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, session_cookie_header("", 0))],
    )
}

/// GET /api/v1/auth/me
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    Ok(Json(DataResponse {
        data: MeResponse {
            user,
            acting_org_id: auth.org_id,
            via_api_key: auth.api_key_id.is_some(),
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sign an access token for `user` acting in `org`. Returns the
/// `Set-Cookie` value and the response body.
pub(crate) fn issue_session(
    state: &AppState,
    user: User,
    org: Option<DbId>,
) -> AppResult<(String, AuthResponse)> {
    let jwt = &state.config.jwt;
    let access_token = generate_access_token(user.id, &user.role, org, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    let cookie = session_cookie_header(&access_token, jwt.expires_in());
    Ok((
        cookie,
        AuthResponse {
            access_token,
            token_type: "Bearer",
            expires_in: jwt.expires_in(),
            user,
        },
    ))
}

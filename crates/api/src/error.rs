use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use llmscope_core::error::CoreError;
use llmscope_core::types::DbId;
use serde::Serialize;

/// Error returned by every handler.
///
/// Domain failures arrive as [`CoreError`], storage failures as
/// [`sqlx::Error`]. The response body is always `{ "error", "code" }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Logged in full; the client sees a generic message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::Validation(errors.to_string()))
    }
}

/// Shorthand for a 404 on an organisation-scoped entity.
pub fn not_found(entity: &'static str, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity, id })
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

const INTERNAL_MESSAGE: &str = "An internal error occurred";

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

impl AppError {
    fn status_code_message(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Core(CoreError::NotFound { entity, id }) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} with id {id} not found"),
            ),
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Core(CoreError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Core(CoreError::Unauthorized(msg)) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::Core(CoreError::Forbidden(msg)) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
            }
            AppError::Core(CoreError::Internal(msg)) | AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = self.status_code_message();
        (status, Json(ErrorBody { error, code })).into_response()
    }
}

/// PostgreSQL SQLSTATE codes the API reports as client errors.
mod sqlstate {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const CHECK_VIOLATION: &str = "23514";
}

/// `RowNotFound` is a 404. Unique violations on `uq_*` constraints are 409,
/// foreign key violations 409 and check violations 400. Anything else is a
/// sanitized 500.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    let db_err = match err {
        sqlx::Error::RowNotFound => {
            return (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Resource not found".to_string(),
            )
        }
        sqlx::Error::Database(db_err) => db_err,
        other => {
            tracing::error!(error = %other, "Database error");
            return internal();
        }
    };

    let constraint = db_err.constraint().unwrap_or("unknown");
    match db_err.code().as_deref() {
        Some(sqlstate::UNIQUE_VIOLATION) if constraint.starts_with("uq_") => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        ),
        Some(sqlstate::FOREIGN_KEY_VIOLATION) => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Referenced row is missing or still in use: {constraint}"),
        ),
        Some(sqlstate::CHECK_VIOLATION) => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            format!("Value violates check constraint: {constraint}"),
        ),
        _ => {
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
    }
}

//! User accounts and credentials.

use llmscope_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `users` table.
///
/// `password_hash` is never serialized.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub current_org_id: Option<DbId>,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering an account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub name: String,
    pub password: String,
}

/// Admin update of another account. Omitted fields are unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserAccess {
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// DTO for password login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

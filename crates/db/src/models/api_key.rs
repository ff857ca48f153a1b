//! API key models and DTOs.

use llmscope_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `api_keys` table.
///
/// **Note:** `key_hash` is never serialized to responses. The `key_prefix`
/// field is used for human-readable identification.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApiKey {
    pub id: DbId,
    pub name: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub key_prefix: String,
    pub user_id: DbId,
    pub org_id: Option<DbId>,
    pub last_used_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Response returned when a new API key is created.
/// Includes the plaintext key (shown exactly once).
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyCreatedResponse {
    pub id: DbId,
    pub name: String,
    pub key_prefix: String,
    /// The full plaintext key. Shown **once** and never stored.
    pub plaintext_key: String,
    pub org_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for creating a new API key.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiKey {
    pub name: String,
}

/// The identity an API key authenticates as.
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyIdentity {
    pub key_id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub org_id: Option<DbId>,
}

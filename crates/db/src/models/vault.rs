//! Vault secret rows. The stored value is always ciphertext.

use llmscope_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `vault_secrets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VaultSecret {
    pub id: DbId,
    pub org_id: Option<DbId>,
    pub key: String,
    #[serde(skip_serializing)]
    pub encrypted_value: String,
    pub description: Option<String>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A secret with its decrypted value, returned by `GET /vault/{id}` only.
#[derive(Debug, Clone, Serialize)]
pub struct RevealedSecret {
    #[serde(flatten)]
    pub secret: VaultSecret,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSecret {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSecret {
    pub value: Option<String>,
    pub description: Option<String>,
}

//! Repository for the `api_keys` table.

use llmscope_core::types::DbId;
use sqlx::PgPool;

use crate::models::api_key::{ApiKey, ApiKeyIdentity};

const COLUMNS: &str = "\
    id, name, key_hash, key_prefix, user_id, org_id, last_used_at, revoked_at, created_at";

/// Provides CRUD operations for API keys.
pub struct ApiKeyRepo;

impl ApiKeyRepo {
    /// Create a new API key. Returns the full row (with hash).
    pub async fn create(
        pool: &PgPool,
        name: &str,
        key_hash: &str,
        key_prefix: &str,
        user_id: DbId,
        org_id: Option<DbId>,
    ) -> Result<ApiKey, sqlx::Error> {
        let query = format!(
            "INSERT INTO api_keys (name, key_hash, key_prefix, user_id, org_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApiKey>(&query)
            .bind(name)
            .bind(key_hash)
            .bind(key_prefix)
            .bind(user_id)
            .bind(org_id)
            .fetch_one(pool)
            .await
    }

    /// List a user's keys, newest first. Revoked keys are included.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<ApiKey>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM api_keys WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, ApiKey>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Resolve a key hash to the identity it authenticates as.
    ///
    /// Only non-revoked keys of active users match. Also stamps
    /// `last_used_at`.
    pub async fn authenticate(
        pool: &PgPool,
        key_hash: &str,
    ) -> Result<Option<ApiKeyIdentity>, sqlx::Error> {
        sqlx::query_as::<_, ApiKeyIdentity>(
            "UPDATE api_keys ak SET last_used_at = NOW() \
             FROM users u \
             WHERE ak.key_hash = $1 AND ak.revoked_at IS NULL \
               AND u.id = ak.user_id AND u.is_active \
             RETURNING ak.id AS key_id, ak.user_id, u.role, ak.org_id",
        )
        .bind(key_hash)
        .fetch_optional(pool)
        .await
    }

    /// Revoke a key owned by `user_id`. Returns `true` if a key was revoked.
    pub async fn revoke(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE api_keys SET revoked_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

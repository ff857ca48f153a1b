//! Repository for the `vault_secrets` table. Values are stored encrypted;
//! this layer never sees plaintext.

use llmscope_core::types::DbId;
use sqlx::PgPool;

use crate::models::vault::VaultSecret;

const COLUMNS: &str = "\
    id, org_id, key, encrypted_value, description, created_by, created_at, updated_at";

pub struct VaultRepo;

impl VaultRepo {
    /// Store a secret. A duplicate key raises `uq_vault_secrets_org_key`.
    pub async fn create(
        pool: &PgPool,
        org_id: Option<DbId>,
        key: &str,
        encrypted_value: &str,
        description: Option<&str>,
        created_by: DbId,
    ) -> Result<VaultSecret, sqlx::Error> {
        let query = format!(
            "INSERT INTO vault_secrets (org_id, key, encrypted_value, description, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VaultSecret>(&query)
            .bind(org_id)
            .bind(key)
            .bind(encrypted_value)
            .bind(description)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool, org_id: Option<DbId>) -> Result<Vec<VaultSecret>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vault_secrets WHERE org_id IS NOT DISTINCT FROM $1 ORDER BY key"
        );
        sqlx::query_as::<_, VaultSecret>(&query)
            .bind(org_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        org_id: Option<DbId>,
    ) -> Result<Option<VaultSecret>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vault_secrets WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2"
        );
        sqlx::query_as::<_, VaultSecret>(&query)
            .bind(id)
            .bind(org_id)
            .fetch_optional(pool)
            .await
    }

    /// Look up a secret by key, e.g. an OpenGround `api_key_secret`.
    pub async fn find_by_key(
        pool: &PgPool,
        key: &str,
        org_id: Option<DbId>,
    ) -> Result<Option<VaultSecret>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vault_secrets WHERE key = $1 AND org_id IS NOT DISTINCT FROM $2"
        );
        sqlx::query_as::<_, VaultSecret>(&query)
            .bind(key)
            .bind(org_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        org_id: Option<DbId>,
        encrypted_value: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<VaultSecret>, sqlx::Error> {
        let query = format!(
            "UPDATE vault_secrets SET \
                 encrypted_value = COALESCE($3, encrypted_value), \
                 description = COALESCE($4, description) \
             WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VaultSecret>(&query)
            .bind(id)
            .bind(org_id)
            .bind(encrypted_value)
            .bind(description)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId, org_id: Option<DbId>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM vault_secrets WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2",
        )
        .bind(id)
        .bind(org_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

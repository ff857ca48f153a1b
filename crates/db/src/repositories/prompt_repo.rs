//! Repository for the `prompts` and `prompt_versions` tables.

use llmscope_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::prompt::{NewPromptVersion, Prompt, PromptVersionRow};

const PROMPT_COLUMNS: &str = "\
    p.id, p.org_id, p.name, p.description, \
    (SELECT v.version FROM prompt_versions v WHERE v.prompt_id = p.id \
     ORDER BY v.major DESC, v.minor DESC, v.patch DESC LIMIT 1) AS latest_version, \
    p.created_by, p.created_at, p.updated_at";

const VERSION_COLUMNS: &str = "\
    id, prompt_id, version, prompt, variables, tags, meta_properties, status, \
    created_by, created_at";

/// Provides prompt and version storage.
pub struct PromptRepo;

impl PromptRepo {
    /// Create a prompt together with its first version.
    pub async fn create(
        pool: &PgPool,
        org_id: Option<DbId>,
        created_by: DbId,
        name: &str,
        description: Option<&str>,
        first_version: &NewPromptVersion<'_>,
    ) -> Result<(Prompt, PromptVersionRow), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO prompts (org_id, name, description, created_by) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(org_id)
        .bind(name)
        .bind(description)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let version = insert_version(&mut *tx, id, created_by, first_version).await?;

        let query = format!("SELECT {PROMPT_COLUMNS} FROM prompts p WHERE p.id = $1");
        let prompt = sqlx::query_as::<_, Prompt>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((prompt, version))
    }

    pub async fn list(
        pool: &PgPool,
        org_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Prompt>, sqlx::Error> {
        let query = format!(
            "SELECT {PROMPT_COLUMNS} FROM prompts p \
             WHERE p.org_id IS NOT DISTINCT FROM $1 \
             ORDER BY p.name LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(org_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        org_id: Option<DbId>,
    ) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!(
            "SELECT {PROMPT_COLUMNS} FROM prompts p \
             WHERE p.id = $1 AND p.org_id IS NOT DISTINCT FROM $2"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(id)
            .bind(org_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId, org_id: Option<DbId>) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM prompts WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2")
                .bind(id)
                .bind(org_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The highest version of a prompt by semantic ordering.
    pub async fn latest_version(
        pool: &PgPool,
        prompt_id: DbId,
    ) -> Result<Option<PromptVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM prompt_versions WHERE prompt_id = $1 \
             ORDER BY major DESC, minor DESC, patch DESC LIMIT 1"
        );
        sqlx::query_as::<_, PromptVersionRow>(&query)
            .bind(prompt_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_version(
        pool: &PgPool,
        prompt_id: DbId,
        version: &str,
    ) -> Result<Option<PromptVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM prompt_versions WHERE prompt_id = $1 AND version = $2"
        );
        sqlx::query_as::<_, PromptVersionRow>(&query)
            .bind(prompt_id)
            .bind(version)
            .fetch_optional(pool)
            .await
    }

    /// All versions, newest first.
    pub async fn list_versions(
        pool: &PgPool,
        prompt_id: DbId,
    ) -> Result<Vec<PromptVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM prompt_versions WHERE prompt_id = $1 \
             ORDER BY major DESC, minor DESC, patch DESC"
        );
        sqlx::query_as::<_, PromptVersionRow>(&query)
            .bind(prompt_id)
            .fetch_all(pool)
            .await
    }

    /// Add a version. A concurrent insert of the same version string raises
    /// `uq_prompt_versions_prompt_version`.
    pub async fn create_version(
        pool: &PgPool,
        prompt_id: DbId,
        created_by: DbId,
        version: &NewPromptVersion<'_>,
    ) -> Result<PromptVersionRow, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let row = insert_version(&mut *tx, prompt_id, created_by, version).await?;
        sqlx::query("UPDATE prompts SET updated_at = NOW() WHERE id = $1")
            .bind(prompt_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row)
    }
}

async fn insert_version(
    conn: &mut PgConnection,
    prompt_id: DbId,
    created_by: DbId,
    v: &NewPromptVersion<'_>,
) -> Result<PromptVersionRow, sqlx::Error> {
    let query = format!(
        "INSERT INTO prompt_versions \
             (prompt_id, version, major, minor, patch, prompt, variables, tags, \
              meta_properties, status, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {VERSION_COLUMNS}"
    );
    sqlx::query_as::<_, PromptVersionRow>(&query)
        .bind(prompt_id)
        .bind(v.version)
        .bind(v.major)
        .bind(v.minor)
        .bind(v.patch)
        .bind(v.prompt)
        .bind(sqlx::types::Json(v.variables))
        .bind(sqlx::types::Json(v.tags))
        .bind(v.meta_properties)
        .bind(v.status)
        .bind(created_by)
        .fetch_one(conn)
        .await
}

//! Repository for OpenGround runs and their per-provider results.

use llmscope_core::openground::ProviderResult;
use llmscope_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::openground::{NewOpengroundRequest, OpengroundRequest, ProviderResultRow};

const REQUEST_COLUMNS: &str = "\
    id, org_id, prompt_source, prompt, prompt_id, prompt_version, variables, stats, \
    total_providers, error_count, created_by, created_at";

const RESULT_COLUMNS: &str = "\
    id, request_id, position, provider, model, config, response, prompt_tokens, \
    completion_tokens, total_tokens, cost, response_time_ms, error, created_at";

pub struct OpengroundRepo;

impl OpengroundRepo {
    /// Persist a run header and every provider result in one transaction.
    /// Results keep their input order through `position`.
    pub async fn create(
        pool: &PgPool,
        request: &NewOpengroundRequest<'_>,
        results: &[ProviderResult],
    ) -> Result<(OpengroundRequest, Vec<ProviderResultRow>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO openground_requests \
                 (org_id, prompt_source, prompt, prompt_id, prompt_version, variables, stats, \
                  total_providers, error_count, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {REQUEST_COLUMNS}"
        );
        let header = sqlx::query_as::<_, OpengroundRequest>(&query)
            .bind(request.org_id)
            .bind(request.prompt_source)
            .bind(request.prompt)
            .bind(request.prompt_id)
            .bind(request.prompt_version)
            .bind(&request.variables)
            .bind(&request.stats)
            .bind(request.total_providers)
            .bind(request.error_count)
            .bind(request.created_by)
            .fetch_one(&mut *tx)
            .await?;

        let insert = format!(
            "INSERT INTO openground_provider_results \
                 (request_id, position, provider, model, config, response, prompt_tokens, \
                  completion_tokens, total_tokens, cost, response_time_ms, error) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {RESULT_COLUMNS}"
        );
        let mut rows = Vec::with_capacity(results.len());
        for (position, result) in results.iter().enumerate() {
            let row = sqlx::query_as::<_, ProviderResultRow>(&insert)
                .bind(header.id)
                .bind(position as i32)
                .bind(result.provider.as_str())
                .bind(&result.model)
                .bind(Json(&result.config))
                .bind(result.response.as_deref())
                .bind(result.prompt_tokens)
                .bind(result.completion_tokens)
                .bind(result.total_tokens)
                .bind(result.cost)
                .bind(result.response_time_ms)
                .bind(result.error.as_deref())
                .fetch_one(&mut *tx)
                .await?;
            rows.push(row);
        }

        tx.commit().await?;
        Ok((header, rows))
    }

    /// Run headers, newest first.
    pub async fn list(
        pool: &PgPool,
        org_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<OpengroundRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM openground_requests \
             WHERE org_id IS NOT DISTINCT FROM $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, OpengroundRequest>(&query)
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
    ) -> Result<Option<OpengroundRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM openground_requests \
             WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2"
        );
        sqlx::query_as::<_, OpengroundRequest>(&query)
            .bind(id)
            .bind(org_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_results(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Vec<ProviderResultRow>, sqlx::Error> {
        let query = format!(
            "SELECT {RESULT_COLUMNS} FROM openground_provider_results \
             WHERE request_id = $1 ORDER BY position"
        );
        sqlx::query_as::<_, ProviderResultRow>(&query)
            .bind(request_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a run; its results cascade.
    pub async fn delete(pool: &PgPool, id: DbId, org_id: Option<DbId>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM openground_requests WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2",
        )
        .bind(id)
        .bind(org_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

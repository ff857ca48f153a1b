//! Repository for the `widgets` table.

use llmscope_core::dashboards::WidgetType;
use llmscope_core::types::DbId;
use sqlx::PgPool;

use crate::models::dashboard::Widget;

const COLUMNS: &str = "\
    id, org_id, name, description, widget_type, config, created_by, created_at, updated_at";

pub struct WidgetRepo;

impl WidgetRepo {
    pub async fn create(
        pool: &PgPool,
        org_id: Option<DbId>,
        name: &str,
        description: Option<&str>,
        widget_type: WidgetType,
        config: &serde_json::Value,
        created_by: DbId,
    ) -> Result<Widget, sqlx::Error> {
        let query = format!(
            "INSERT INTO widgets (org_id, name, description, widget_type, config, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Widget>(&query)
            .bind(org_id)
            .bind(name)
            .bind(description)
            .bind(widget_type.as_str())
            .bind(config)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool, org_id: Option<DbId>) -> Result<Vec<Widget>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM widgets WHERE org_id IS NOT DISTINCT FROM $1 ORDER BY name"
        );
        sqlx::query_as::<_, Widget>(&query)
            .bind(org_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        org_id: Option<DbId>,
    ) -> Result<Option<Widget>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM widgets WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2"
        );
        sqlx::query_as::<_, Widget>(&query)
            .bind(id)
            .bind(org_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        org_id: Option<DbId>,
        name: Option<&str>,
        description: Option<&str>,
        widget_type: Option<WidgetType>,
        config: Option<&serde_json::Value>,
    ) -> Result<Option<Widget>, sqlx::Error> {
        let query = format!(
            "UPDATE widgets SET \
                 name = COALESCE($3, name), \
                 description = COALESCE($4, description), \
                 widget_type = COALESCE($5, widget_type), \
                 config = COALESCE($6, config) \
             WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Widget>(&query)
            .bind(id)
            .bind(org_id)
            .bind(name)
            .bind(description)
            .bind(widget_type.map(WidgetType::as_str))
            .bind(config)
            .fetch_optional(pool)
            .await
    }

    /// Delete a widget; its placements cascade.
    pub async fn delete(pool: &PgPool, id: DbId, org_id: Option<DbId>) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM widgets WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2")
                .bind(id)
                .bind(org_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

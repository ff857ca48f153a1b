//! Repository for `dashboards` and `dashboard_widgets`.

use llmscope_core::dashboards::Placement;
use llmscope_core::types::DbId;
use sqlx::PgPool;

use crate::models::dashboard::{Dashboard, PlacedWidget};

const COLUMNS: &str = "\
    id, org_id, name, description, is_main, created_by, created_at, updated_at";

pub struct DashboardRepo;

impl DashboardRepo {
    /// Create a dashboard. When `is_main` is set the previous main
    /// dashboard of the organisation is cleared in the same transaction.
    pub async fn create(
        pool: &PgPool,
        org_id: Option<DbId>,
        name: &str,
        description: Option<&str>,
        is_main: bool,
        created_by: DbId,
    ) -> Result<Dashboard, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if is_main {
            sqlx::query(
                "UPDATE dashboards SET is_main = false \
                 WHERE org_id IS NOT DISTINCT FROM $1 AND is_main",
            )
            .bind(org_id)
            .execute(&mut *tx)
            .await?;
        }

        let query = format!(
            "INSERT INTO dashboards (org_id, name, description, is_main, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        );
        let dashboard = sqlx::query_as::<_, Dashboard>(&query)
            .bind(org_id)
            .bind(name)
            .bind(description)
            .bind(is_main)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(dashboard)
    }

    pub async fn list(pool: &PgPool, org_id: Option<DbId>) -> Result<Vec<Dashboard>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dashboards WHERE org_id IS NOT DISTINCT FROM $1 \
             ORDER BY is_main DESC, name"
        );
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(org_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        org_id: Option<DbId>,
    ) -> Result<Option<Dashboard>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dashboards WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2"
        );
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(id)
            .bind(org_id)
            .fetch_optional(pool)
            .await
    }

    /// Update a dashboard. Setting `is_main` clears the previous main one.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        org_id: Option<DbId>,
        name: Option<&str>,
        description: Option<&str>,
        is_main: Option<bool>,
    ) -> Result<Option<Dashboard>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if is_main == Some(true) {
            sqlx::query(
                "UPDATE dashboards SET is_main = false \
                 WHERE org_id IS NOT DISTINCT FROM $1 AND is_main AND id <> $2",
            )
            .bind(org_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let query = format!(
            "UPDATE dashboards SET \
                 name = COALESCE($3, name), \
                 description = COALESCE($4, description), \
                 is_main = COALESCE($5, is_main) \
             WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2 \
             RETURNING {COLUMNS}"
        );
        let dashboard = sqlx::query_as::<_, Dashboard>(&query)
            .bind(id)
            .bind(org_id)
            .bind(name)
            .bind(description)
            .bind(is_main)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(dashboard)
    }

    pub async fn delete(pool: &PgPool, id: DbId, org_id: Option<DbId>) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM dashboards WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2")
                .bind(id)
                .bind(org_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Widgets on a dashboard in reading order (top to bottom, left to right).
    pub async fn list_widgets(
        pool: &PgPool,
        dashboard_id: DbId,
    ) -> Result<Vec<PlacedWidget>, sqlx::Error> {
        sqlx::query_as::<_, PlacedWidget>(
            "SELECT w.id AS widget_id, w.name, w.widget_type, w.config, dw.x, dw.y, dw.w, dw.h \
             FROM dashboard_widgets dw JOIN widgets w ON w.id = dw.widget_id \
             WHERE dw.dashboard_id = $1 ORDER BY dw.y, dw.x",
        )
        .bind(dashboard_id)
        .fetch_all(pool)
        .await
    }

    /// Place a widget, or move it if it is already on the dashboard.
    pub async fn place_widget(
        pool: &PgPool,
        dashboard_id: DbId,
        widget_id: DbId,
        placement: &Placement,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO dashboard_widgets (dashboard_id, widget_id, x, y, w, h) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT ON CONSTRAINT uq_dashboard_widgets_dashboard_widget \
             DO UPDATE SET x = EXCLUDED.x, y = EXCLUDED.y, w = EXCLUDED.w, h = EXCLUDED.h",
        )
        .bind(dashboard_id)
        .bind(widget_id)
        .bind(placement.x)
        .bind(placement.y)
        .bind(placement.w)
        .bind(placement.h)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn remove_widget(
        pool: &PgPool,
        dashboard_id: DbId,
        widget_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM dashboard_widgets WHERE dashboard_id = $1 AND widget_id = $2",
        )
        .bind(dashboard_id)
        .bind(widget_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

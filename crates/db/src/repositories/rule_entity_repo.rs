//! Repository for the `rule_entities` table.

use llmscope_core::rules::EntityType;
use llmscope_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::rule::RuleEntity;

const COLUMNS: &str = "id, rule_id, entity_type, entity_id, created_at";

/// Provides rule-to-entity bindings.
pub struct RuleEntityRepo;

impl RuleEntityRepo {
    /// Insert a binding on an open connection or transaction.
    pub async fn insert(
        conn: &mut PgConnection,
        rule_id: DbId,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<RuleEntity, sqlx::Error> {
        let query = format!(
            "INSERT INTO rule_entities (rule_id, entity_type, entity_id) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RuleEntity>(&query)
            .bind(rule_id)
            .bind(entity_type.as_str())
            .bind(entity_id)
            .fetch_one(conn)
            .await
    }

    /// Bind a rule to an entity. A duplicate raises `uq_rule_entities`.
    pub async fn create(
        pool: &PgPool,
        rule_id: DbId,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<RuleEntity, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::insert(&mut *conn, rule_id, entity_type, entity_id).await
    }

    pub async fn list_for_rule(pool: &PgPool, rule_id: DbId) -> Result<Vec<RuleEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM rule_entities WHERE rule_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, RuleEntity>(&query)
            .bind(rule_id)
            .fetch_all(pool)
            .await
    }

    /// Bindings of the given rules for one entity type, in rule order.
    pub async fn list_for_rules(
        pool: &PgPool,
        rule_ids: &[DbId],
        entity_type: EntityType,
        entity_id: Option<&str>,
    ) -> Result<Vec<RuleEntity>, sqlx::Error> {
        if rule_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM rule_entities \
             WHERE rule_id = ANY($1) AND entity_type = $2 \
               AND ($3::TEXT IS NULL OR entity_id = $3) \
             ORDER BY array_position($1, rule_id), id"
        );
        sqlx::query_as::<_, RuleEntity>(&query)
            .bind(rule_ids)
            .bind(entity_type.as_str())
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }

    /// All bindings in the organisation, optionally filtered.
    pub async fn search(
        pool: &PgPool,
        org_id: Option<DbId>,
        entity_type: Option<EntityType>,
        entity_id: Option<&str>,
    ) -> Result<Vec<RuleEntity>, sqlx::Error> {
        let query = "\
            SELECT e.id, e.rule_id, e.entity_type, e.entity_id, e.created_at \
            FROM rule_entities e JOIN rules r ON r.id = e.rule_id \
            WHERE r.org_id IS NOT DISTINCT FROM $1 \
              AND ($2::TEXT IS NULL OR e.entity_type = $2) \
              AND ($3::TEXT IS NULL OR e.entity_id = $3) \
            ORDER BY e.created_at DESC, e.id DESC";
        sqlx::query_as::<_, RuleEntity>(query)
            .bind(org_id)
            .bind(entity_type.map(EntityType::as_str))
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }

    /// Remove one binding of a rule by binding id.
    pub async fn delete(pool: &PgPool, rule_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rule_entities WHERE id = $1 AND rule_id = $2")
            .bind(id)
            .bind(rule_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

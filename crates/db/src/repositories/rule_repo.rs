//! Repository for `rules`, `rule_condition_groups` and `rule_conditions`.

use llmscope_core::rules::{EntityType, GroupOperator, Rule, RuleStatus};
use llmscope_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::rule::{
    assemble_rule, ConditionGroupDetail, ConditionGroupRow, ConditionRow, NewConditionGroup,
    RuleDetail, RuleRow,
};
use crate::repositories::rule_entity_repo::RuleEntityRepo;

const COLUMNS: &str = "\
    id, org_id, name, description, group_operator, status, created_by, created_at, updated_at";

const GROUP_COLUMNS: &str = "id, rule_id, condition_operator, position";

const CONDITION_COLUMNS: &str = "id, group_id, field, operator, value, data_type, position";

/// Header fields of a new rule.
pub struct NewRule<'a> {
    pub org_id: Option<DbId>,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub group_operator: GroupOperator,
    pub status: RuleStatus,
    pub created_by: DbId,
}

/// Provides CRUD for rules and loading of evaluable rule sets.
pub struct RuleRepo;

impl RuleRepo {
    /// Create a rule with its groups and entity bindings in one transaction.
    pub async fn create(
        pool: &PgPool,
        rule: &NewRule<'_>,
        groups: &[NewConditionGroup],
        entities: &[(EntityType, String)],
    ) -> Result<RuleRow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO rules (org_id, name, description, group_operator, status, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, RuleRow>(&query)
            .bind(rule.org_id)
            .bind(rule.name)
            .bind(rule.description)
            .bind(rule.group_operator.as_str())
            .bind(rule.status.as_str())
            .bind(rule.created_by)
            .fetch_one(&mut *tx)
            .await?;

        insert_groups(&mut *tx, row.id, groups).await?;
        for (entity_type, entity_id) in entities {
            RuleEntityRepo::insert(&mut *tx, row.id, *entity_type, entity_id).await?;
        }

        tx.commit().await?;
        Ok(row)
    }

    pub async fn list(
        pool: &PgPool,
        org_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RuleRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM rules WHERE org_id IS NOT DISTINCT FROM $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, RuleRow>(&query)
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
    ) -> Result<Option<RuleRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM rules WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2"
        );
        sqlx::query_as::<_, RuleRow>(&query)
            .bind(id)
            .bind(org_id)
            .fetch_optional(pool)
            .await
    }

    /// A rule with its groups, conditions and entity bindings.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
        org_id: Option<DbId>,
    ) -> Result<Option<RuleDetail>, sqlx::Error> {
        let Some(rule) = Self::find_by_id(pool, id, org_id).await? else {
            return Ok(None);
        };
        let groups = load_groups(pool, &[rule.id]).await?;
        let group_ids: Vec<DbId> = groups.iter().map(|g| g.id).collect();
        let conditions = load_conditions(pool, &group_ids).await?;
        let entities = RuleEntityRepo::list_for_rule(pool, rule.id).await?;

        let groups = groups
            .into_iter()
            .map(|group| {
                let conditions = conditions
                    .iter()
                    .filter(|c| c.group_id == group.id)
                    .cloned()
                    .collect();
                ConditionGroupDetail { group, conditions }
            })
            .collect();

        Ok(Some(RuleDetail {
            rule,
            groups,
            entities,
        }))
    }

    /// Update header fields. `None` leaves a field unchanged.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        org_id: Option<DbId>,
        name: Option<&str>,
        description: Option<&str>,
        group_operator: Option<GroupOperator>,
        status: Option<RuleStatus>,
    ) -> Result<Option<RuleRow>, sqlx::Error> {
        let query = format!(
            "UPDATE rules SET \
                 name = COALESCE($3, name), \
                 description = COALESCE($4, description), \
                 group_operator = COALESCE($5, group_operator), \
                 status = COALESCE($6, status) \
             WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RuleRow>(&query)
            .bind(id)
            .bind(org_id)
            .bind(name)
            .bind(description)
            .bind(group_operator.map(GroupOperator::as_str))
            .bind(status.map(RuleStatus::as_str))
            .fetch_optional(pool)
            .await
    }

    /// Delete a rule; groups, conditions and bindings cascade.
    pub async fn delete(pool: &PgPool, id: DbId, org_id: Option<DbId>) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM rules WHERE id = $1 AND org_id IS NOT DISTINCT FROM $2")
                .bind(id)
                .bind(org_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace every group and condition of a rule atomically, optionally
    /// changing its group operator.
    pub async fn replace_conditions(
        pool: &PgPool,
        rule_id: DbId,
        group_operator: Option<GroupOperator>,
        groups: &[NewConditionGroup],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM rule_condition_groups WHERE rule_id = $1")
            .bind(rule_id)
            .execute(&mut *tx)
            .await?;

        insert_groups(&mut *tx, rule_id, groups).await?;

        sqlx::query(
            "UPDATE rules SET group_operator = COALESCE($2, group_operator), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(rule_id)
        .bind(group_operator.map(GroupOperator::as_str))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Load the active rules bound to `entity_type` (and `entity_id`, when
    /// given) in the organisation, ready for evaluation. Rules come back in
    /// creation order.
    pub async fn load_active_for_entity(
        pool: &PgPool,
        org_id: Option<DbId>,
        entity_type: EntityType,
        entity_id: Option<&str>,
    ) -> Result<Vec<Rule>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM rules r \
             WHERE r.org_id IS NOT DISTINCT FROM $1 AND r.status = 'ACTIVE' \
               AND EXISTS ( \
                   SELECT 1 FROM rule_entities e \
                   WHERE e.rule_id = r.id AND e.entity_type = $2 \
                     AND ($3::TEXT IS NULL OR e.entity_id = $3) \
               ) \
             ORDER BY r.created_at, r.id"
        );
        let rows = sqlx::query_as::<_, RuleRow>(&query)
            .bind(org_id)
            .bind(entity_type.as_str())
            .bind(entity_id)
            .fetch_all(pool)
            .await?;
        assemble_all(pool, &rows).await
    }

    /// Load one rule as an evaluable [`Rule`], regardless of status.
    pub async fn load_rule(
        pool: &PgPool,
        id: DbId,
        org_id: Option<DbId>,
    ) -> Result<Option<Rule>, sqlx::Error> {
        let Some(row) = Self::find_by_id(pool, id, org_id).await? else {
            return Ok(None);
        };
        let mut rules = assemble_all(pool, std::slice::from_ref(&row)).await?;
        Ok(rules.pop())
    }
}

async fn assemble_all(pool: &PgPool, rows: &[RuleRow]) -> Result<Vec<Rule>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let rule_ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
    let groups = load_groups(pool, &rule_ids).await?;
    let group_ids: Vec<DbId> = groups.iter().map(|g| g.id).collect();
    let conditions = load_conditions(pool, &group_ids).await?;

    rows.iter()
        .map(|row| {
            assemble_rule(row, &groups, &conditions)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))
        })
        .collect()
}

async fn load_groups(pool: &PgPool, rule_ids: &[DbId]) -> Result<Vec<ConditionGroupRow>, sqlx::Error> {
    let query = format!(
        "SELECT {GROUP_COLUMNS} FROM rule_condition_groups \
         WHERE rule_id = ANY($1) ORDER BY rule_id, position, id"
    );
    sqlx::query_as::<_, ConditionGroupRow>(&query)
        .bind(rule_ids)
        .fetch_all(pool)
        .await
}

async fn load_conditions(
    pool: &PgPool,
    group_ids: &[DbId],
) -> Result<Vec<ConditionRow>, sqlx::Error> {
    if group_ids.is_empty() {
        return Ok(Vec::new());
    }
    let query = format!(
        "SELECT {CONDITION_COLUMNS} FROM rule_conditions \
         WHERE group_id = ANY($1) ORDER BY group_id, position, id"
    );
    sqlx::query_as::<_, ConditionRow>(&query)
        .bind(group_ids)
        .fetch_all(pool)
        .await
}

async fn insert_groups(
    conn: &mut PgConnection,
    rule_id: DbId,
    groups: &[NewConditionGroup],
) -> Result<(), sqlx::Error> {
    for (group_position, group) in groups.iter().enumerate() {
        let group_id: DbId = sqlx::query_scalar(
            "INSERT INTO rule_condition_groups (rule_id, condition_operator, position) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(rule_id)
        .bind(group.condition_operator.as_str())
        .bind(group_position as i32)
        .fetch_one(&mut *conn)
        .await?;

        for (position, condition) in group.conditions.iter().enumerate() {
            sqlx::query(
                "INSERT INTO rule_conditions (group_id, field, operator, value, data_type, position) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(group_id)
            .bind(&condition.field)
            .bind(condition.operator.as_str())
            .bind(&condition.value)
            .bind(condition.data_type.as_str())
            .bind(position as i32)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

//! Rule engine rows, DTOs and the conversion into evaluable core rules.

use std::collections::HashMap;

use llmscope_core::error::CoreError;
use llmscope_core::rules::limits::{validate_condition, validate_group_sizes};
use llmscope_core::rules::{
    Condition, ConditionGroup, ConditionOperator, DataType, EntityType, GroupOperator, Rule,
    RuleStatus,
};
use llmscope_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

// ── Rows ─────────────────────────────────────────────────────────────

/// A row from the `rules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RuleRow {
    pub id: DbId,
    pub org_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub group_operator: String,
    pub status: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `rule_condition_groups` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConditionGroupRow {
    pub id: DbId,
    pub rule_id: DbId,
    pub condition_operator: String,
    pub position: i32,
}

/// A row from the `rule_conditions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConditionRow {
    pub id: DbId,
    pub group_id: DbId,
    pub field: String,
    pub operator: String,
    pub value: String,
    pub data_type: String,
    pub position: i32,
}

/// A row from the `rule_entities` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RuleEntity {
    pub id: DbId,
    pub rule_id: DbId,
    pub entity_type: String,
    pub entity_id: String,
    pub created_at: Timestamp,
}

// ── Detail views ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ConditionGroupDetail {
    #[serde(flatten)]
    pub group: ConditionGroupRow,
    pub conditions: Vec<ConditionRow>,
}

/// A rule with its groups, conditions and entity bindings.
#[derive(Debug, Clone, Serialize)]
pub struct RuleDetail {
    #[serde(flatten)]
    pub rule: RuleRow,
    pub groups: Vec<ConditionGroupDetail>,
    pub entities: Vec<RuleEntity>,
}

// ── DTOs ─────────────────────────────────────────────────────────────

/// One condition as submitted by a client. `value` may be any JSON
/// primitive or an array (for `in`/`not_in`/`between`).
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionInput {
    pub field: String,
    pub operator: String,
    pub value: Value,
    pub data_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionGroupInput {
    pub condition_operator: Option<String>,
    pub conditions: Vec<ConditionInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleEntityInput {
    pub entity_type: String,
    pub entity_id: String,
}

/// DTO for creating a rule, optionally with its conditions and bindings.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRule {
    pub name: String,
    pub description: Option<String>,
    pub group_operator: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub groups: Vec<ConditionGroupInput>,
    #[serde(default)]
    pub entities: Vec<RuleEntityInput>,
}

/// DTO for updating a rule's header. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRule {
    pub name: Option<String>,
    pub description: Option<String>,
    pub group_operator: Option<String>,
    pub status: Option<String>,
}

/// DTO replacing every group and condition of a rule.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceConditions {
    pub group_operator: Option<String>,
    pub groups: Vec<ConditionGroupInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityInputs {
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

/// Body of `POST /rules/evaluate`.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    pub entity_type: String,
    pub entity_id: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub include_entity_data: bool,
    #[serde(default)]
    pub entity_inputs: Option<EntityInputs>,
}

/// Data of one governed entity, returned when `include_entity_data` is set.
#[derive(Debug, Clone, Serialize)]
pub struct EntityData {
    pub entity_type: String,
    pub entity_id: String,
    /// `None` when the entity no longer exists or has no loadable data.
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateResponse {
    pub matched_rule_ids: Vec<DbId>,
    pub entities: Vec<RuleEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_data: Option<Vec<EntityData>>,
}

// ── Validated definitions ────────────────────────────────────────────

/// A condition that passed validation, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCondition {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewConditionGroup {
    pub condition_operator: GroupOperator,
    pub conditions: Vec<NewCondition>,
}

/// Render a condition value as the text stored in `rule_conditions.value`.
/// Strings are stored as-is; other JSON is stored in its JSON form, so an
/// array stays parseable as a list.
pub fn literal_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse and validate submitted groups.
pub fn validate_groups(groups: &[ConditionGroupInput]) -> Result<Vec<NewConditionGroup>, CoreError> {
    let sizes: Vec<usize> = groups.iter().map(|g| g.conditions.len()).collect();
    validate_group_sizes(&sizes)?;

    groups
        .iter()
        .map(|group| -> Result<NewConditionGroup, CoreError> {
            let condition_operator: GroupOperator = match &group.condition_operator {
                Some(op) => op.parse()?,
                None => GroupOperator::And,
            };
            let conditions = group
                .conditions
                .iter()
                .map(|c| -> Result<NewCondition, CoreError> {
                    let operator: ConditionOperator = c.operator.parse()?;
                    let data_type: DataType = match &c.data_type {
                        Some(dt) => dt.parse()?,
                        None => DataType::String,
                    };
                    let value = literal_text(&c.value);
                    validate_condition(&c.field, operator, &value, data_type)?;
                    Ok(NewCondition {
                        field: c.field.trim().to_string(),
                        operator,
                        value,
                        data_type,
                    })
                })
                .collect::<Result<Vec<_>, CoreError>>()?;
            Ok(NewConditionGroup {
                condition_operator,
                conditions,
            })
        })
        .collect()
}

/// Parse and validate an entity binding.
pub fn validate_entity(input: &RuleEntityInput) -> Result<(EntityType, String), CoreError> {
    let entity_type: EntityType = input.entity_type.parse()?;
    let entity_id = input.entity_id.trim();
    if entity_id.is_empty() || entity_id.len() > 256 {
        return Err(CoreError::Validation(
            "entity_id must be 1 to 256 characters".to_string(),
        ));
    }
    Ok((entity_type, entity_id.to_string()))
}

// ── Assembly ─────────────────────────────────────────────────────────

/// Build an evaluable [`Rule`] from its rows. Groups and conditions must
/// already be in position order.
pub fn assemble_rule(
    row: &RuleRow,
    groups: &[ConditionGroupRow],
    conditions: &[ConditionRow],
) -> Result<Rule, CoreError> {
    let groups = groups
        .iter()
        .filter(|g| g.rule_id == row.id)
        .map(|g| -> Result<ConditionGroup, CoreError> {
            let conditions = conditions
                .iter()
                .filter(|c| c.group_id == g.id)
                .map(|c| -> Result<Condition, CoreError> {
                    Ok(Condition::new(
                        c.id,
                        c.field.clone(),
                        c.operator.parse()?,
                        c.value.clone(),
                        c.data_type.parse()?,
                    ))
                })
                .collect::<Result<Vec<_>, CoreError>>()?;
            Ok(ConditionGroup {
                id: g.id,
                condition_operator: g.condition_operator.parse()?,
                conditions,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    Ok(Rule {
        id: row.id,
        name: row.name.clone(),
        group_operator: row.group_operator.parse()?,
        status: row.status.parse::<RuleStatus>()?,
        groups,
    })
}

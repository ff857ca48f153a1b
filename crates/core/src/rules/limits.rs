//! Input caps and definition checks for the rule engine.
//!
//! These run at the API boundary; the evaluator itself never rejects input.

use regex::Regex;
use serde_json::{Map, Value};

use super::coerce::{coerce_literal, split_bounds, split_list};
use super::model::{ConditionOperator, DataType};
use crate::error::CoreError;

/// Maximum number of fields in an evaluation request.
pub const MAX_EVALUATE_FIELDS: usize = 100;

/// Maximum length of a field name, in characters.
pub const MAX_FIELD_KEY_LENGTH: usize = 256;

/// Maximum length of a string field value, in characters.
pub const MAX_FIELD_VALUE_LENGTH: usize = 10_000;

/// Maximum length of a rule name.
pub const MAX_RULE_NAME_LENGTH: usize = 200;

/// Maximum length of a rule description.
pub const MAX_RULE_DESCRIPTION_LENGTH: usize = 2_000;

/// Maximum number of condition groups per rule.
pub const MAX_GROUPS_PER_RULE: usize = 20;

/// Maximum number of conditions per group.
pub const MAX_CONDITIONS_PER_GROUP: usize = 50;

/// Maximum length of a condition value literal.
pub const MAX_CONDITION_VALUE_LENGTH: usize = 4_000;

/// Validate the field map of an evaluation request.
pub fn validate_evaluate_fields(fields: &Map<String, Value>) -> Result<(), CoreError> {
    if fields.len() > MAX_EVALUATE_FIELDS {
        return Err(CoreError::Validation(format!(
            "fields exceeds maximum of {MAX_EVALUATE_FIELDS} entries (got {})",
            fields.len()
        )));
    }
    for (key, value) in fields {
        if key.trim().is_empty() {
            return Err(CoreError::Validation(
                "field names must not be empty".to_string(),
            ));
        }
        if key.chars().count() > MAX_FIELD_KEY_LENGTH {
            return Err(CoreError::Validation(format!(
                "field name exceeds maximum length of {MAX_FIELD_KEY_LENGTH} characters"
            )));
        }
        match value {
            Value::Array(_) | Value::Object(_) => {
                return Err(CoreError::Validation(format!(
                    "field '{key}' must be a string, number, boolean or null"
                )));
            }
            Value::String(s) if s.chars().count() > MAX_FIELD_VALUE_LENGTH => {
                return Err(CoreError::Validation(format!(
                    "field '{key}' exceeds maximum value length of {MAX_FIELD_VALUE_LENGTH} characters"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Validate a rule's name and optional description.
pub fn validate_rule_name(name: &str, description: Option<&str>) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Rule name must not be empty".into()));
    }
    if name.chars().count() > MAX_RULE_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Rule name exceeds maximum length of {MAX_RULE_NAME_LENGTH} characters"
        )));
    }
    if description.is_some_and(|d| d.chars().count() > MAX_RULE_DESCRIPTION_LENGTH) {
        return Err(CoreError::Validation(format!(
            "Rule description exceeds maximum length of {MAX_RULE_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate the shape of a condition set: group count and group sizes.
pub fn validate_group_sizes(sizes: &[usize]) -> Result<(), CoreError> {
    if sizes.len() > MAX_GROUPS_PER_RULE {
        return Err(CoreError::Validation(format!(
            "A rule may have at most {MAX_GROUPS_PER_RULE} condition groups (got {})",
            sizes.len()
        )));
    }
    for (index, size) in sizes.iter().enumerate() {
        if *size == 0 {
            return Err(CoreError::Validation(format!(
                "Condition group {index} must contain at least one condition"
            )));
        }
        if *size > MAX_CONDITIONS_PER_GROUP {
            return Err(CoreError::Validation(format!(
                "Condition group {index} exceeds maximum of {MAX_CONDITIONS_PER_GROUP} conditions"
            )));
        }
    }
    Ok(())
}

/// Validate one condition definition before it is stored.
pub fn validate_condition(
    field: &str,
    operator: ConditionOperator,
    value: &str,
    data_type: DataType,
) -> Result<(), CoreError> {
    if field.trim().is_empty() {
        return Err(CoreError::Validation(
            "Condition field must not be empty".into(),
        ));
    }
    if field.chars().count() > MAX_FIELD_KEY_LENGTH {
        return Err(CoreError::Validation(format!(
            "Condition field exceeds maximum length of {MAX_FIELD_KEY_LENGTH} characters"
        )));
    }
    if value.chars().count() > MAX_CONDITION_VALUE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Condition value exceeds maximum length of {MAX_CONDITION_VALUE_LENGTH} characters"
        )));
    }

    if data_type == DataType::Boolean && (operator.is_ordering() || operator.is_textual()) {
        return Err(CoreError::Validation(format!(
            "Operator '{operator}' cannot be used with boolean conditions"
        )));
    }

    let literal_ok = |literal: &str| {
        operator.is_textual() || coerce_literal(literal, data_type).is_some()
    };

    match operator {
        ConditionOperator::Regex => {
            Regex::new(value).map_err(|e| {
                CoreError::Validation(format!("Invalid regular expression '{value}': {e}"))
            })?;
        }
        ConditionOperator::Between => {
            let (low, high) = split_bounds(value).ok_or_else(|| {
                CoreError::Validation("'between' needs exactly two bounds, e.g. \"1,10\"".into())
            })?;
            if !literal_ok(low.as_str()) || !literal_ok(high.as_str()) {
                return Err(CoreError::Validation(format!(
                    "'between' bounds must be valid {} values",
                    data_type.as_str()
                )));
            }
        }
        ConditionOperator::In | ConditionOperator::NotIn => {
            let items = split_list(value);
            if items.is_empty() {
                return Err(CoreError::Validation(format!(
                    "'{operator}' needs at least one value"
                )));
            }
            if let Some(bad) = items.iter().find(|item| !literal_ok(item.as_str())) {
                return Err(CoreError::Validation(format!(
                    "'{bad}' is not a valid {} value",
                    data_type.as_str()
                )));
            }
        }
        _ => {
            if !literal_ok(value) {
                return Err(CoreError::Validation(format!(
                    "'{value}' is not a valid {} value",
                    data_type.as_str()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn primitive_fields_are_accepted() {
        let f = fields(json!({"model": "gpt-4o", "tokens": 12, "stream": false, "user": null}));
        assert!(validate_evaluate_fields(&f).is_ok());
    }

    #[test]
    fn too_many_fields_rejected() {
        let f: Map<String, Value> = (0..=MAX_EVALUATE_FIELDS)
            .map(|i| (format!("f{i}"), json!(i)))
            .collect();
        assert_matches!(validate_evaluate_fields(&f), Err(CoreError::Validation(_)));
    }

    #[test]
    fn nested_values_rejected() {
        let f = fields(json!({"meta": {"a": 1}}));
        assert_matches!(validate_evaluate_fields(&f), Err(CoreError::Validation(_)));
        let f = fields(json!({"tags": ["a"]}));
        assert_matches!(validate_evaluate_fields(&f), Err(CoreError::Validation(_)));
    }

    #[test]
    fn oversized_value_rejected() {
        let f = fields(json!({"prompt": "x".repeat(MAX_FIELD_VALUE_LENGTH + 1)}));
        assert_matches!(validate_evaluate_fields(&f), Err(CoreError::Validation(_)));
    }

    #[test]
    fn empty_key_rejected() {
        let f = fields(json!({" ": 1}));
        assert_matches!(validate_evaluate_fields(&f), Err(CoreError::Validation(_)));
    }

    #[test]
    fn regex_must_compile() {
        assert!(validate_condition("q", ConditionOperator::Regex, "^a+$", DataType::String).is_ok());
        assert_matches!(
            validate_condition("q", ConditionOperator::Regex, "(", DataType::String),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn between_needs_two_numeric_bounds() {
        assert!(validate_condition("n", ConditionOperator::Between, "1,5", DataType::Number).is_ok());
        assert!(validate_condition("n", ConditionOperator::Between, "1", DataType::Number).is_err());
        assert!(validate_condition("n", ConditionOperator::Between, "a,b", DataType::Number).is_err());
    }

    #[test]
    fn in_needs_items() {
        assert!(validate_condition("n", ConditionOperator::In, " , ", DataType::String).is_err());
        assert!(validate_condition("n", ConditionOperator::In, "1,x", DataType::Number).is_err());
        assert!(validate_condition("n", ConditionOperator::In, "1,2", DataType::Number).is_ok());
    }

    #[test]
    fn boolean_rejects_ordering_and_text_operators() {
        assert!(validate_condition("b", ConditionOperator::Gt, "true", DataType::Boolean).is_err());
        assert!(validate_condition("b", ConditionOperator::Contains, "t", DataType::Boolean).is_err());
        assert!(validate_condition("b", ConditionOperator::Equals, "true", DataType::Boolean).is_ok());
        assert!(validate_condition("b", ConditionOperator::Equals, "maybe", DataType::Boolean).is_err());
    }

    #[test]
    fn number_literal_must_parse() {
        assert!(validate_condition("n", ConditionOperator::Gt, "ten", DataType::Number).is_err());
        assert!(validate_condition("n", ConditionOperator::Gt, "10", DataType::Number).is_ok());
    }

    #[test]
    fn group_sizes_bounded() {
        assert!(validate_group_sizes(&[1, 2]).is_ok());
        assert!(validate_group_sizes(&[1, 0]).is_err());
        assert!(validate_group_sizes(&[MAX_CONDITIONS_PER_GROUP + 1]).is_err());
        assert!(validate_group_sizes(&vec![1; MAX_GROUPS_PER_RULE + 1]).is_err());
    }

    #[test]
    fn rule_name_checks() {
        assert!(validate_rule_name("  ", None).is_err());
        assert!(validate_rule_name("ok", Some(&"d".repeat(MAX_RULE_DESCRIPTION_LENGTH + 1))).is_err());
        assert!(validate_rule_name("Route finance prompts", Some("desc")).is_ok());
    }
}

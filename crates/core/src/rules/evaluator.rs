//! Rule evaluator -- pure logic, no database access.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::coerce::{coerce_input, coerce_literal, split_bounds, split_list, stringify, Operand};
use super::model::{Condition, ConditionGroup, ConditionOperator, Rule, RuleStatus};
use crate::types::DbId;

/// Ids of the active rules that match `input`, in the order given.
pub fn matching_rule_ids(rules: &[Rule], input: &Map<String, Value>) -> Vec<DbId> {
    rules
        .iter()
        .filter(|rule| rule.status == RuleStatus::Active)
        .filter(|rule| rule_matches(rule, input))
        .map(|rule| rule.id)
        .collect()
}

/// Whether a rule's groups, combined by its group operator, hold for `input`.
///
/// Status is not checked here; see [`matching_rule_ids`].
pub fn rule_matches(rule: &Rule, input: &Map<String, Value>) -> bool {
    rule.group_operator
        .combine(rule.groups.iter().map(|group| group_matches(group, input)))
}

fn group_matches(group: &ConditionGroup, input: &Map<String, Value>) -> bool {
    group.condition_operator.combine(
        group
            .conditions
            .iter()
            .map(|condition| condition_matches(condition, input.get(&condition.field))),
    )
}

/// Apply one condition to the input field it names.
///
/// A missing or null field never matches, whatever the operator.
pub fn condition_matches(condition: &Condition, field: Option<&Value>) -> bool {
    let value = match field {
        Some(v) if !v.is_null() => v,
        _ => return false,
    };

    match condition.operator {
        ConditionOperator::Equals => equality(condition, value).unwrap_or(false),
        ConditionOperator::NotEquals => equality(condition, value).is_some_and(|eq| !eq),
        ConditionOperator::Gt => ordered(condition, value, |o| o == Ordering::Greater),
        ConditionOperator::Gte => ordered(condition, value, |o| o != Ordering::Less),
        ConditionOperator::Lt => ordered(condition, value, |o| o == Ordering::Less),
        ConditionOperator::Lte => ordered(condition, value, |o| o != Ordering::Greater),
        ConditionOperator::Between => between(condition, value),
        ConditionOperator::In => member_of(condition, value).unwrap_or(false),
        ConditionOperator::NotIn => member_of(condition, value).is_some_and(|found| !found),
        ConditionOperator::Contains => text(value, |s| s.contains(condition.value.as_str())),
        ConditionOperator::NotContains => text(value, |s| !s.contains(condition.value.as_str())),
        ConditionOperator::StartsWith => text(value, |s| s.starts_with(condition.value.as_str())),
        ConditionOperator::EndsWith => text(value, |s| s.ends_with(condition.value.as_str())),
        ConditionOperator::Regex => match condition.pattern() {
            Some(re) => text(value, |s| re.is_match(s)),
            None => false,
        },
    }
}

/// `Some(equal)` when both sides coerce, `None` otherwise.
fn equality(condition: &Condition, value: &Value) -> Option<bool> {
    let input = coerce_input(value, condition.data_type)?;
    let literal = coerce_literal(&condition.value, condition.data_type)?;
    Some(input == literal)
}

fn ordered(condition: &Condition, value: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    let (Some(input), Some(literal)) = (
        coerce_input(value, condition.data_type),
        coerce_literal(&condition.value, condition.data_type),
    ) else {
        return false;
    };
    input.partial_order(&literal).is_some_and(accept)
}

fn between(condition: &Condition, value: &Value) -> bool {
    let Some((low, high)) = split_bounds(&condition.value) else {
        return false;
    };
    let (Some(input), Some(low), Some(high)) = (
        coerce_input(value, condition.data_type),
        coerce_literal(&low, condition.data_type),
        coerce_literal(&high, condition.data_type),
    ) else {
        return false;
    };
    let above_low = input
        .partial_order(&low)
        .is_some_and(|o| o != Ordering::Less);
    let below_high = input
        .partial_order(&high)
        .is_some_and(|o| o != Ordering::Greater);
    above_low && below_high
}

/// `Some(found)` when the input coerces, `None` otherwise.
fn member_of(condition: &Condition, value: &Value) -> Option<bool> {
    let input = coerce_input(value, condition.data_type)?;
    let found = split_list(&condition.value)
        .iter()
        .filter_map(|item| coerce_literal(item, condition.data_type))
        .any(|item: Operand| item == input);
    Some(found)
}

fn text(value: &Value, test: impl Fn(&str) -> bool) -> bool {
    stringify(value).is_some_and(|s| test(&s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::model::{DataType, GroupOperator};
    use serde_json::json;

    fn cond(field: &str, operator: ConditionOperator, value: &str, data_type: DataType) -> Condition {
        Condition::new(0, field, operator, value, data_type)
    }

    fn group(op: GroupOperator, conditions: Vec<Condition>) -> ConditionGroup {
        ConditionGroup {
            id: 0,
            condition_operator: op,
            conditions,
        }
    }

    fn rule(id: DbId, op: GroupOperator, groups: Vec<ConditionGroup>) -> Rule {
        Rule {
            id,
            name: format!("rule-{id}"),
            group_operator: op,
            status: RuleStatus::Active,
            groups,
        }
    }

    fn input(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object literal")
    }

    fn check(c: &Condition, value: Value) -> bool {
        condition_matches(c, Some(&value))
    }

    #[test]
    fn or_rule_from_two_and_groups() {
        let r = rule(
            1,
            GroupOperator::Or,
            vec![
                group(
                    GroupOperator::And,
                    vec![cond("x", ConditionOperator::Equals, "a", DataType::String)],
                ),
                group(
                    GroupOperator::And,
                    vec![cond("y", ConditionOperator::Gt, "5", DataType::Number)],
                ),
            ],
        );
        assert!(rule_matches(&r, &input(json!({"x": "a", "y": 1}))));
        assert!(rule_matches(&r, &input(json!({"x": "b", "y": 10}))));
        assert!(!rule_matches(&r, &input(json!({"x": "b", "y": 1}))));
    }

    #[test]
    fn and_rule_needs_every_group() {
        let r = rule(
            1,
            GroupOperator::And,
            vec![
                group(
                    GroupOperator::Or,
                    vec![
                        cond("model", ConditionOperator::Equals, "gpt-4o", DataType::String),
                        cond("model", ConditionOperator::Equals, "gpt-4", DataType::String),
                    ],
                ),
                group(
                    GroupOperator::And,
                    vec![cond("env", ConditionOperator::Equals, "prod", DataType::String)],
                ),
            ],
        );
        assert!(rule_matches(&r, &input(json!({"model": "gpt-4", "env": "prod"}))));
        assert!(!rule_matches(&r, &input(json!({"model": "gpt-4", "env": "dev"}))));
        assert!(!rule_matches(&r, &input(json!({"model": "claude", "env": "prod"}))));
    }

    #[test]
    fn and_group_needs_every_condition() {
        let g = group(
            GroupOperator::And,
            vec![
                cond("a", ConditionOperator::Equals, "1", DataType::Number),
                cond("b", ConditionOperator::Equals, "2", DataType::Number),
            ],
        );
        let r = rule(1, GroupOperator::And, vec![g]);
        assert!(rule_matches(&r, &input(json!({"a": 1, "b": 2}))));
        assert!(!rule_matches(&r, &input(json!({"a": 1, "b": 3}))));
    }

    #[test]
    fn rule_without_groups_never_matches() {
        let r = rule(1, GroupOperator::And, vec![]);
        assert!(!rule_matches(&r, &input(json!({"x": "a"}))));
    }

    #[test]
    fn group_without_conditions_never_matches() {
        let r = rule(1, GroupOperator::Or, vec![group(GroupOperator::And, vec![])]);
        assert!(!rule_matches(&r, &input(json!({"x": "a"}))));
    }

    #[test]
    fn inactive_rules_are_skipped() {
        let c = cond("x", ConditionOperator::Equals, "a", DataType::String);
        let active = rule(1, GroupOperator::And, vec![group(GroupOperator::And, vec![c.clone()])]);
        let mut inactive = rule(2, GroupOperator::And, vec![group(GroupOperator::And, vec![c])]);
        inactive.status = RuleStatus::Inactive;

        let ids = matching_rule_ids(&[active, inactive], &input(json!({"x": "a"})));
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn matching_ids_keep_rule_order() {
        let c = cond("x", ConditionOperator::Contains, "a", DataType::String);
        let rules: Vec<Rule> = [5, 3, 9]
            .into_iter()
            .map(|id| rule(id, GroupOperator::And, vec![group(GroupOperator::And, vec![c.clone()])]))
            .collect();
        assert_eq!(matching_rule_ids(&rules, &input(json!({"x": "abc"}))), vec![5, 3, 9]);
    }

    #[test]
    fn equals_is_type_coerced() {
        let c = cond("n", ConditionOperator::Equals, "10", DataType::Number);
        assert!(check(&c, json!(10)));
        assert!(check(&c, json!("10.0")));
        assert!(!check(&c, json!(10.5)));

        let s = cond("n", ConditionOperator::Equals, "10", DataType::String);
        assert!(check(&s, json!(10)));
        assert!(!check(&s, json!("10.0")));
    }

    #[test]
    fn missing_field_is_false_even_for_negations() {
        for op in [
            ConditionOperator::NotEquals,
            ConditionOperator::NotContains,
            ConditionOperator::NotIn,
        ] {
            let c = cond("x", op, "a", DataType::String);
            assert!(!condition_matches(&c, None), "{op} on missing field");
            assert!(!condition_matches(&c, Some(&Value::Null)), "{op} on null");
        }
    }

    #[test]
    fn uncoercible_input_is_false() {
        let c = cond("n", ConditionOperator::NotEquals, "5", DataType::Number);
        assert!(!check(&c, json!("five")));
        assert!(check(&c, json!(6)));
    }

    #[test]
    fn in_matches_list_members() {
        let c = cond("provider", ConditionOperator::In, "openai, anthropic", DataType::String);
        assert!(check(&c, json!("anthropic")));
        assert!(!check(&c, json!("mistral")));

        let n = cond("tier", ConditionOperator::In, "[1, 2, 3]", DataType::Number);
        assert!(check(&n, json!(2)));
        assert!(check(&n, json!("3")));
        assert!(!check(&n, json!(4)));
    }

    #[test]
    fn not_in_excludes_list_members() {
        let c = cond("env", ConditionOperator::NotIn, "dev,staging", DataType::String);
        assert!(check(&c, json!("prod")));
        assert!(!check(&c, json!("dev")));
    }

    #[test]
    fn between_is_inclusive() {
        let c = cond("temperature", ConditionOperator::Between, "0.2,0.8", DataType::Number);
        assert!(check(&c, json!(0.2)));
        assert!(check(&c, json!(0.5)));
        assert!(check(&c, json!(0.8)));
        assert!(!check(&c, json!(0.81)));
        assert!(!check(&c, json!(0.1)));
    }

    #[test]
    fn between_with_malformed_bounds_never_matches() {
        let c = cond("n", ConditionOperator::Between, "5", DataType::Number);
        assert!(!check(&c, json!(5)));
    }

    #[test]
    fn numeric_ordering_operators() {
        let gt = cond("n", ConditionOperator::Gt, "5", DataType::Number);
        let gte = cond("n", ConditionOperator::Gte, "5", DataType::Number);
        let lt = cond("n", ConditionOperator::Lt, "5", DataType::Number);
        let lte = cond("n", ConditionOperator::Lte, "5", DataType::Number);
        assert!(!check(&gt, json!(5)));
        assert!(check(&gte, json!(5)));
        assert!(!check(&lt, json!(5)));
        assert!(check(&lte, json!(5)));
        assert!(check(&gt, json!(5.01)));
        assert!(check(&lt, json!(-1)));
    }

    #[test]
    fn string_ordering_is_lexicographic() {
        let c = cond("version", ConditionOperator::Gt, "b", DataType::String);
        assert!(check(&c, json!("c")));
        assert!(!check(&c, json!("a")));
    }

    #[test]
    fn boolean_never_orders() {
        let c = cond("flag", ConditionOperator::Gt, "false", DataType::Boolean);
        assert!(!check(&c, json!(true)));
    }

    #[test]
    fn boolean_equality() {
        let c = cond("stream", ConditionOperator::Equals, "true", DataType::Boolean);
        assert!(check(&c, json!(true)));
        assert!(check(&c, json!("TRUE")));
        assert!(!check(&c, json!(false)));
    }

    #[test]
    fn substring_operators() {
        let contains = cond("q", ConditionOperator::Contains, "refund", DataType::String);
        let not_contains = cond("q", ConditionOperator::NotContains, "refund", DataType::String);
        let starts = cond("q", ConditionOperator::StartsWith, "How", DataType::String);
        let ends = cond("q", ConditionOperator::EndsWith, "?", DataType::String);
        let q = json!("How do I get a refund?");
        assert!(check(&contains, q.clone()));
        assert!(!check(&not_contains, q.clone()));
        assert!(check(&starts, q.clone()));
        assert!(check(&ends, q));
        assert!(!check(&starts, json!("how lowercase")));
    }

    #[test]
    fn regex_matches_and_invalid_pattern_is_false() {
        let c = cond("email", ConditionOperator::Regex, r"^[^@]+@example\.com$", DataType::String);
        assert!(check(&c, json!("ops@example.com")));
        assert!(!check(&c, json!("ops@example.org")));

        let bad = cond("email", ConditionOperator::Regex, "([unclosed", DataType::String);
        assert!(!check(&bad, json!("anything")));
    }
}

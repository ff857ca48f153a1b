//! Rule engine types.
//!
//! The database stores every enum here as TEXT. Each enum exposes
//! `as_str()` for writes and a [`FromStr`] impl that reports unknown names
//! as [`CoreError::Validation`].

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// How child results combine: all must hold, or any must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupOperator {
    And,
    Or,
}

impl GroupOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Fold a sequence of results. Returns `false` for an empty sequence.
    pub fn combine<I: IntoIterator<Item = bool>>(self, results: I) -> bool {
        let mut iter = results.into_iter().peekable();
        if iter.peek().is_none() {
            return false;
        }
        match self {
            Self::And => iter.all(|r| r),
            Self::Or => iter.any(|r| r),
        }
    }
}

impl FromStr for GroupOperator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            _ => Err(CoreError::Validation(format!(
                "Unknown group operator '{s}' (expected AND or OR)"
            ))),
        }
    }
}

/// Whether a rule takes part in evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleStatus {
    Active,
    Inactive,
}

impl RuleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for RuleStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            _ => Err(CoreError::Validation(format!(
                "Unknown rule status '{s}' (expected ACTIVE or INACTIVE)"
            ))),
        }
    }
}

/// Leaf predicate applied to one input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    In,
    NotIn,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
}

impl ConditionOperator {
    pub const ALL: [ConditionOperator; 14] = [
        Self::Equals,
        Self::NotEquals,
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::EndsWith,
        Self::Regex,
        Self::In,
        Self::NotIn,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Between,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Regex => "regex",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Between => "between",
        }
    }

    /// Operators whose value is a list of literals.
    pub fn is_list(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Operators that order values rather than compare them for equality.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::Gt | Self::Gte | Self::Lt | Self::Lte | Self::Between
        )
    }

    /// Operators that work on the text form of the input.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            Self::Contains | Self::NotContains | Self::StartsWith | Self::EndsWith | Self::Regex
        )
    }
}

impl FromStr for ConditionOperator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown condition operator '{s}'")))
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type the input and the condition value are coerced to before comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Boolean,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl FromStr for DataType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            _ => Err(CoreError::Validation(format!(
                "Unknown data type '{s}' (expected string, number or boolean)"
            ))),
        }
    }
}

/// Kind of entity a rule can govern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Context,
    Prompt,
    Dataset,
    MetaConfig,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Prompt => "prompt",
            Self::Dataset => "dataset",
            Self::MetaConfig => "meta_config",
        }
    }
}

impl FromStr for EntityType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "context" => Ok(Self::Context),
            "prompt" => Ok(Self::Prompt),
            "dataset" => Ok(Self::Dataset),
            "meta_config" => Ok(Self::MetaConfig),
            _ => Err(CoreError::Validation(format!(
                "Unknown entity type '{s}' (expected context, prompt, dataset or meta_config)"
            ))),
        }
    }
}

/// A single leaf predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub id: DbId,
    pub field: String,
    pub operator: ConditionOperator,
    pub value: String,
    pub data_type: DataType,
    /// `value` compiled as a regular expression, filled on first use.
    #[serde(skip)]
    pattern: OnceLock<Option<Regex>>,
}

impl Condition {
    pub fn new(
        id: DbId,
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            id,
            field: field.into(),
            operator,
            value: value.into(),
            data_type,
            pattern: OnceLock::new(),
        }
    }

    /// The value as a regular expression, compiled once per condition.
    /// `None` when it is not a valid pattern.
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern
            .get_or_init(|| Regex::new(&self.value).ok())
            .as_ref()
    }
}

/// Conditions combined by one operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub id: DbId,
    pub condition_operator: GroupOperator,
    pub conditions: Vec<Condition>,
}

/// A rule ready for evaluation, with its groups loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: DbId,
    pub name: String,
    pub group_operator: GroupOperator,
    pub status: RuleStatus,
    pub groups: Vec<ConditionGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_round_trip_through_names() {
        for op in ConditionOperator::ALL {
            assert_eq!(op.as_str().parse::<ConditionOperator>().unwrap(), op);
        }
    }

    #[test]
    fn pattern_is_compiled_once_and_kept() {
        let condition = Condition::new(1, "model", ConditionOperator::Regex, "^gpt-4", DataType::String);
        let first = condition.pattern().unwrap() as *const Regex;
        let second = condition.pattern().unwrap() as *const Regex;
        assert_eq!(first, second);
        assert!(condition.pattern().unwrap().is_match("gpt-4o"));
    }

    #[test]
    fn invalid_pattern_is_none() {
        let condition = Condition::new(1, "model", ConditionOperator::Regex, "(", DataType::String);
        assert!(condition.pattern().is_none());
    }

    #[test]
    fn unknown_operator_is_validation_error() {
        let err = "approximately".parse::<ConditionOperator>().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn group_operator_parse_is_case_insensitive() {
        assert_eq!("or".parse::<GroupOperator>().unwrap(), GroupOperator::Or);
        assert_eq!("AND".parse::<GroupOperator>().unwrap(), GroupOperator::And);
    }

    #[test]
    fn combine_all_and_any() {
        assert!(GroupOperator::And.combine([true, true]));
        assert!(!GroupOperator::And.combine([true, false]));
        assert!(GroupOperator::Or.combine([false, true]));
        assert!(!GroupOperator::Or.combine([false, false]));
    }

    #[test]
    fn combine_empty_is_false() {
        assert!(!GroupOperator::And.combine(std::iter::empty()));
        assert!(!GroupOperator::Or.combine(std::iter::empty()));
    }

    #[test]
    fn entity_type_serializes_snake_case() {
        let json = serde_json::to_string(&EntityType::MetaConfig).unwrap();
        assert_eq!(json, "\"meta_config\"");
    }
}

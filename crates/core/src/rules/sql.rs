//! Compile a rule into a parameterised SQL `WHERE` fragment.
//!
//! The fragment targets a JSONB attribute column: each condition reads
//! `<column> ->> $field`. Field names and literals are always bind
//! parameters; only operators and casts are templated into the text.

use super::coerce::{coerce_literal, split_bounds, split_list, Operand};
use super::model::{Condition, ConditionGroup, ConditionOperator, DataType, GroupOperator, Rule};

/// A bind parameter for a compiled filter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Number(f64),
    TextList(Vec<String>),
    NumberList(Vec<f64>),
}

/// A compiled `WHERE` fragment and its parameters, numbered from
/// `first_param`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    pub clause: String,
    pub params: Vec<SqlParam>,
}

impl SqlFilter {
    /// Index of the next free placeholder (`$n`) after this filter's params.
    pub fn next_param(&self, first_param: usize) -> usize {
        first_param + self.params.len()
    }
}

/// Text an attribute must match before it is cast to a number. Accepts
/// what Rust's `f64` parser accepts apart from `inf` and `NaN`: an optional
/// sign, `5`, `5.`, `.5` and an exponent.
pub const NUMERIC_PATTERN: &str = r"^\s*[-+]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][-+]?[0-9]+)?\s*$";

/// Largest finite `f64`. Attributes beyond it do not coerce to a number.
const MAX_FINITE: &str = "1.7976931348623157e308";

struct Compiler<'a> {
    column: &'a str,
    first_param: usize,
    params: Vec<SqlParam>,
}

impl<'a> Compiler<'a> {
    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.first_param + self.params.len() - 1)
    }

    fn rule(&mut self, rule: &Rule) -> String {
        let parts: Vec<String> = rule.groups.iter().map(|g| self.group(g)).collect();
        join(&parts, rule.group_operator)
    }

    fn group(&mut self, group: &ConditionGroup) -> String {
        let parts: Vec<String> = group
            .conditions
            .iter()
            .map(|c| self.condition(c))
            .collect();
        join(&parts, group.condition_operator)
    }

    fn condition(&mut self, c: &Condition) -> String {
        let field = self.bind(SqlParam::Text(c.field.clone()));
        let text = format!("({} ->> {field})", self.column);

        if c.operator.is_textual() {
            let literal = self.bind(SqlParam::Text(c.value.clone()));
            return match c.operator {
                ConditionOperator::Contains => format!("(strpos({text}, {literal}) > 0)"),
                ConditionOperator::NotContains => format!("(strpos({text}, {literal}) = 0)"),
                ConditionOperator::StartsWith => format!("(left({text}, length({literal})) = {literal})"),
                ConditionOperator::EndsWith => format!("(right({text}, length({literal})) = {literal})"),
                _ => format!("({text} ~ {literal})"),
            };
        }

        match c.data_type {
            DataType::Number => self.number_condition(c, &text),
            DataType::String => self.text_condition(c, &text),
            DataType::Boolean => self.bool_condition(c, &field, &text),
        }
    }

    fn number_condition(&mut self, c: &Condition, text: &str) -> String {
        // Nested CASE: the cast only runs on text that passed the pattern.
        // Values beyond the `f64` range compare as NULL.
        let number = format!(
            "(CASE WHEN {text} ~ '{NUMERIC_PATTERN}' THEN \
             CASE WHEN abs(({text})::numeric) <= {MAX_FINITE} THEN ({text})::numeric END END)"
        );
        match c.operator {
            ConditionOperator::In | ConditionOperator::NotIn => {
                let items: Vec<f64> = split_list(&c.value)
                    .iter()
                    .filter_map(|s| parse_number(s))
                    .collect();
                let list = self.bind(SqlParam::NumberList(items));
                membership(c.operator, &number, &format!("{list}::numeric[]"))
            }
            ConditionOperator::Between => match bounds(&c.value, parse_number) {
                Some((low, high)) => {
                    let low = self.bind(SqlParam::Number(low));
                    let high = self.bind(SqlParam::Number(high));
                    format!("({number} BETWEEN {low}::numeric AND {high}::numeric)")
                }
                None => "FALSE".to_string(),
            },
            op => match parse_number(&c.value) {
                Some(v) => {
                    let literal = self.bind(SqlParam::Number(v));
                    format!("({number} {} {literal}::numeric)", comparison(op))
                }
                None => "FALSE".to_string(),
            },
        }
    }

    fn text_condition(&mut self, c: &Condition, text: &str) -> String {
        match c.operator {
            ConditionOperator::In | ConditionOperator::NotIn => {
                let list = self.bind(SqlParam::TextList(split_list(&c.value)));
                membership(c.operator, text, &list)
            }
            ConditionOperator::Between => match bounds(&c.value, |s| Some(s.to_string())) {
                Some((low, high)) => {
                    let low = self.bind(SqlParam::Text(low));
                    let high = self.bind(SqlParam::Text(high));
                    format!("({text} BETWEEN {low} AND {high})")
                }
                None => "FALSE".to_string(),
            },
            op => {
                let literal = self.bind(SqlParam::Text(c.value.clone()));
                format!("({text} {} {literal})", comparison(op))
            }
        }
    }

    /// Booleans compare as the text `true`/`false`. JSON booleans pass
    /// through, JSON numbers `1`/`0` and the strings `true`, `false`, `1`,
    /// `0` (any case, surrounding whitespace ignored) are normalised, and
    /// anything else is `NULL`.
    fn bool_condition(&mut self, c: &Condition, field: &str, text: &str) -> String {
        let normalize = |s: &str| match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some("true".to_string()),
            "false" | "0" => Some("false".to_string()),
            _ => None,
        };
        let normalized = format!(
            "(CASE jsonb_typeof({column} -> {field}) \
             WHEN 'boolean' THEN {text} \
             WHEN 'number' THEN CASE ({text})::numeric WHEN 1 THEN 'true' WHEN 0 THEN 'false' END \
             WHEN 'string' THEN CASE lower(btrim({text}, E' \\t\\n\\r')) \
             WHEN 'true' THEN 'true' WHEN '1' THEN 'true' \
             WHEN 'false' THEN 'false' WHEN '0' THEN 'false' END \
             END)",
            column = self.column,
        );
        match c.operator {
            ConditionOperator::Equals | ConditionOperator::NotEquals => match normalize(c.value.as_str()) {
                Some(v) => {
                    let literal = self.bind(SqlParam::Text(v));
                    format!("({normalized} {} {literal})", comparison(c.operator))
                }
                None => "FALSE".to_string(),
            },
            ConditionOperator::In | ConditionOperator::NotIn => {
                let items: Vec<String> = split_list(&c.value)
                    .iter()
                    .filter_map(|s| normalize(s.as_str()))
                    .collect();
                let list = self.bind(SqlParam::TextList(items));
                membership(c.operator, &normalized, &list)
            }
            _ => "FALSE".to_string(),
        }
    }
}

fn comparison(op: ConditionOperator) -> &'static str {
    match op {
        ConditionOperator::NotEquals => "<>",
        ConditionOperator::Gt => ">",
        ConditionOperator::Gte => ">=",
        ConditionOperator::Lt => "<",
        ConditionOperator::Lte => "<=",
        _ => "=",
    }
}

fn membership(op: ConditionOperator, operand: &str, list: &str) -> String {
    if op == ConditionOperator::NotIn {
        format!("({operand} <> ALL({list}))")
    } else {
        format!("({operand} = ANY({list}))")
    }
}

/// Literal side of a numeric condition, parsed as the evaluator parses it.
fn parse_number(s: &str) -> Option<f64> {
    match coerce_literal(s, DataType::Number) {
        Some(Operand::Number(v)) => Some(v),
        _ => None,
    }
}

fn bounds<T>(literal: &str, parse: impl Fn(&str) -> Option<T>) -> Option<(T, T)> {
    let (low, high) = split_bounds(literal)?;
    Some((parse(&low)?, parse(&high)?))
}

fn join(parts: &[String], op: GroupOperator) -> String {
    if parts.is_empty() {
        return "FALSE".to_string();
    }
    let separator = match op {
        GroupOperator::And => " AND ",
        GroupOperator::Or => " OR ",
    };
    format!("({})", parts.join(separator))
}

/// Compile `rule` against the JSONB `column`, numbering placeholders from
/// `first_param` (1-based, as PostgreSQL expects).
pub fn compile_rule(rule: &Rule, column: &str, first_param: usize) -> SqlFilter {
    let mut compiler = Compiler {
        column,
        first_param,
        params: Vec::new(),
    };
    let clause = compiler.rule(rule);
    SqlFilter {
        clause,
        params: compiler.params,
    }
}

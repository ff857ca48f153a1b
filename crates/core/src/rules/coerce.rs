//! Coercion of input values and condition literals to a [`DataType`].

use std::cmp::Ordering;

use serde_json::Value;

use super::model::DataType;

/// A value after coercion, comparable with another of the same kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Operand {
    /// Order two operands of the same kind. Booleans are not ordered.
    pub fn partial_order(&self, other: &Operand) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Render a primitive JSON value as text. Arrays, objects and null have no
/// text form.
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerce an input field value.
pub fn coerce_input(value: &Value, data_type: DataType) -> Option<Operand> {
    match data_type {
        DataType::String => stringify(value).map(Operand::Text),
        DataType::Number => match value {
            Value::Number(n) => n.as_f64().map(Operand::Number),
            Value::String(s) => parse_number(s).map(Operand::Number),
            _ => None,
        },
        DataType::Boolean => match value {
            Value::Bool(b) => Some(Operand::Bool(*b)),
            Value::String(s) => parse_bool(s).map(Operand::Bool),
            Value::Number(n) => match n.as_f64() {
                Some(v) if v == 1.0 => Some(Operand::Bool(true)),
                Some(v) if v == 0.0 => Some(Operand::Bool(false)),
                _ => None,
            },
            _ => None,
        },
    }
}

/// Coerce a condition literal stored as text.
pub fn coerce_literal(literal: &str, data_type: DataType) -> Option<Operand> {
    match data_type {
        DataType::String => Some(Operand::Text(literal.to_string())),
        DataType::Number => parse_number(literal).map(Operand::Number),
        DataType::Boolean => parse_bool(literal).map(Operand::Bool),
    }
}

/// Split a list literal into its items.
///
/// Accepts a JSON array of primitives (`["a", 1]`) or a comma-separated
/// string (`a, b`). Empty items are dropped.
pub fn split_list(literal: &str) -> Vec<String> {
    let trimmed = literal.trim();
    if trimmed.starts_with('[') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
            return items.iter().filter_map(stringify).collect();
        }
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a `between` literal into exactly two bounds.
pub fn split_bounds(literal: &str) -> Option<(String, String)> {
    let mut items = split_list(literal).into_iter();
    match (items.next(), items.next(), items.next()) {
        (Some(low), Some(high), None) => Some((low, high)),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

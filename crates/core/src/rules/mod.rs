//! Rule engine: condition groups evaluated against flat field maps.
//!
//! - [`model`] -- rule, group and condition types plus their operator enums.
//! - [`coerce`] -- `data_type`-driven coercion of inputs and literals.
//! - [`evaluator`] -- pure evaluation over already-loaded rules.
//! - [`sql`] -- compiles a rule into a parameterised SQL filter.
//! - [`limits`] -- input caps enforced at the API boundary.

pub mod coerce;
pub mod evaluator;
pub mod limits;
pub mod model;
pub mod sql;

pub use evaluator::{condition_matches, matching_rule_ids, rule_matches};
pub use model::{
    Condition, ConditionGroup, ConditionOperator, DataType, EntityType, GroupOperator, Rule,
    RuleStatus,
};

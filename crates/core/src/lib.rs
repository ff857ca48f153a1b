//! Domain logic for llmscope.
//!
//! Everything in this crate is pure: no database, no HTTP. The `db`,
//! `providers` and `api` crates build on these types.

pub mod api_keys;
pub mod dashboards;
pub mod error;
pub mod openground;
pub mod organisations;
pub mod pagination;
pub mod prompts;
pub mod rules;
pub mod types;
pub mod vault;

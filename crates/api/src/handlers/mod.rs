//! Request handlers.
//!
//! Each submodule holds the async handlers of one resource. Handlers
//! validate input first, delegate storage to the matching repository in
//! `llmscope_db` and map failures through [`AppError`](crate::error::AppError).

pub mod admin;
pub mod api_keys;
pub mod auth;
pub mod dashboards;
pub mod openground;
pub mod organisations;
pub mod prompts;
pub mod rules;
pub mod traces;
pub mod vault;
pub mod widgets;

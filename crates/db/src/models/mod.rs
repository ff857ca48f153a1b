//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - `FromRow` + `Serialize` structs matching database rows
//! - `Deserialize` create DTOs for inserts
//! - `Deserialize` update DTOs (all `Option` fields) for patches

pub mod api_key;
pub mod dashboard;
pub mod openground;
pub mod organisation;
pub mod prompt;
pub mod rule;
pub mod trace;
pub mod user;
pub mod vault;

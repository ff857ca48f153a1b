//! Shared query parameter types for API handlers.

use llmscope_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Clamped `(limit, offset)`.
    pub fn resolve(&self) -> (i64, i64) {
        (
            clamp_limit(self.limit, DEFAULT_LIMIT, MAX_LIMIT),
            clamp_offset(self.offset),
        )
    }
}

/// `?version=` on prompt reads.
#[derive(Debug, Deserialize)]
pub struct VersionParams {
    pub version: Option<String>,
}

/// `?entity_type=&entity_id=` on the rule-entity search.
#[derive(Debug, Deserialize)]
pub struct EntitySearchParams {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
}

//! Prompt Hub models and DTOs.

use std::collections::HashMap;

use llmscope_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `prompts` table, with its latest version string.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Prompt {
    pub id: DbId,
    pub org_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub latest_version: Option<String>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `prompt_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PromptVersionRow {
    pub id: DbId,
    pub prompt_id: DbId,
    pub version: String,
    pub prompt: String,
    pub variables: serde_json::Value,
    pub tags: serde_json::Value,
    pub meta_properties: serde_json::Value,
    pub status: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// A prompt with one resolved version.
#[derive(Debug, Clone, Serialize)]
pub struct PromptDetail {
    #[serde(flatten)]
    pub prompt: Prompt,
    pub version: Option<PromptVersionRow>,
}

/// DTO for creating a prompt together with version `1.0.0`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePrompt {
    pub name: String,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    pub prompt: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub meta_properties: Option<serde_json::Value>,
    pub status: Option<String>,
}

/// DTO for adding a version to an existing prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePromptVersion {
    pub prompt: String,
    /// `major`, `minor` or `patch` (default).
    pub bump: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub meta_properties: Option<serde_json::Value>,
    pub status: Option<String>,
}

/// Fields shared by every version insert.
#[derive(Debug, Clone)]
pub struct NewPromptVersion<'a> {
    pub version: &'a str,
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
    pub prompt: &'a str,
    pub variables: &'a [String],
    pub tags: &'a [String],
    pub meta_properties: &'a serde_json::Value,
    pub status: &'a str,
}

/// Body of `POST /prompts/{id}/compile`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompilePromptRequest {
    pub version: Option<String>,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompilePromptResponse {
    pub prompt_id: DbId,
    pub version: String,
    pub compiled: String,
    pub missing_variables: Vec<String>,
}

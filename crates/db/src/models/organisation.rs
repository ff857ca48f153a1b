//! Organisations and their members.

use llmscope_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `organisations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Organisation {
    pub id: DbId,
    pub name: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An organisation together with the caller's role in it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrganisationWithRole {
    pub id: DbId,
    pub name: String,
    pub created_by: DbId,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A member row joined with the user's email and name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrganisationMember {
    pub id: DbId,
    pub organisation_id: DbId,
    pub user_id: DbId,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrganisation {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrganisation {
    pub name: Option<String>,
}

/// DTO for adding a member by email.
#[derive(Debug, Clone, Deserialize)]
pub struct AddMember {
    pub email: String,
    /// `owner`, `admin` or `member`. Defaults to `member`.
    pub role: Option<String>,
}

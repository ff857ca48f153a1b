//! Role-based access control.
//!
//! Platform roles gate instance-wide operations; organisation roles gate
//! what a member may do inside an organisation.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use llmscope_core::error::CoreError;
use llmscope_core::organisations::MemberRole;
use llmscope_core::types::DbId;
use llmscope_db::repositories::OrganisationRepo;

use super::auth::AuthUser;
use crate::error::{not_found, AppError, AppResult};
use crate::state::AppState;

/// Platform role with full access.
pub const ROLE_ADMIN: &str = "admin";

/// Default platform role.
pub const ROLE_MEMBER: &str = "member";

pub fn validate_platform_role(role: &str) -> Result<(), CoreError> {
    match role {
        ROLE_ADMIN | ROLE_MEMBER => Ok(()),
        other => Err(CoreError::Validation(format!(
            "Unknown role '{other}' (expected admin or member)"
        ))),
    }
}

/// Requires the platform `admin` role. Rejects with 403 Forbidden otherwise.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// The caller's membership in one organisation.
#[derive(Debug, Clone, Copy)]
pub struct OrgMembership {
    pub org_id: DbId,
    pub role: MemberRole,
}

impl OrgMembership {
    /// Load the caller's role in `org_id`. Non-members get a 404 so the
    /// organisation's existence is not revealed.
    pub async fn load(state: &AppState, org_id: DbId, user: &AuthUser) -> AppResult<Self> {
        let role = OrganisationRepo::member_role(&state.pool, org_id, user.user_id)
            .await?
            .ok_or_else(|| not_found("Organisation", org_id))?;
        let role: MemberRole = role
            .parse()
            .map_err(|e: CoreError| AppError::InternalError(e.to_string()))?;
        Ok(Self { org_id, role })
    }

    /// Owners and admins only.
    pub fn require_manager(&self) -> AppResult<()> {
        llmscope_core::organisations::ensure_can_manage(self.role)?;
        Ok(())
    }

    pub fn require_owner(&self) -> AppResult<()> {
        if !self.role.can_delete() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Only owners can do this".into(),
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn membership(role: MemberRole) -> OrgMembership {
        OrgMembership { org_id: 1, role }
    }

    #[test]
    fn members_cannot_manage() {
        assert_matches!(
            membership(MemberRole::Member).require_manager(),
            Err(AppError::Core(CoreError::Forbidden(_)))
        );
        assert!(membership(MemberRole::Admin).require_manager().is_ok());
    }

    #[test]
    fn only_owners_pass_the_owner_check() {
        assert_matches!(
            membership(MemberRole::Admin).require_owner(),
            Err(AppError::Core(CoreError::Forbidden(_)))
        );
        assert!(membership(MemberRole::Owner).require_owner().is_ok());
    }

    #[test]
    fn platform_roles() {
        assert!(validate_platform_role("admin").is_ok());
        assert!(validate_platform_role("member").is_ok());
        assert_matches!(validate_platform_role("owner"), Err(CoreError::Validation(_)));
    }
}

//! Organisation membership roles and what each role may do.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of an organisation name.
pub const MAX_ORGANISATION_NAME_LENGTH: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Member,
    Admin,
    Owner,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// Owners and admins may rename the organisation and manage members.
    pub fn can_manage(self) -> bool {
        self >= Self::Admin
    }

    /// Only owners may delete the organisation.
    pub fn can_delete(self) -> bool {
        self == Self::Owner
    }

    /// Whether this role may grant `target` to someone else. Admins cannot
    /// mint owners.
    pub fn can_grant(self, target: MemberRole) -> bool {
        self.can_manage() && target <= self
    }
}

impl FromStr for MemberRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            _ => Err(CoreError::Validation(format!(
                "Unknown member role '{s}' (expected owner, admin or member)"
            ))),
        }
    }
}

/// Validate an organisation name.
pub fn validate_organisation_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Organisation name must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_ORGANISATION_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Organisation name exceeds maximum length of {MAX_ORGANISATION_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Check that a membership with `role` allows managing the organisation.
pub fn ensure_can_manage(role: MemberRole) -> Result<(), CoreError> {
    if role.can_manage() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Organisation owner or admin role required".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_permissions() {
        assert!(MemberRole::Owner.can_delete());
        assert!(!MemberRole::Admin.can_delete());
        assert!(MemberRole::Admin.can_manage());
        assert!(!MemberRole::Member.can_manage());
    }

    #[test]
    fn admins_cannot_grant_owner() {
        assert!(!MemberRole::Admin.can_grant(MemberRole::Owner));
        assert!(MemberRole::Admin.can_grant(MemberRole::Admin));
        assert!(MemberRole::Owner.can_grant(MemberRole::Owner));
        assert!(!MemberRole::Member.can_grant(MemberRole::Member));
    }

    #[test]
    fn ensure_can_manage_is_forbidden_for_members() {
        assert!(matches!(
            ensure_can_manage(MemberRole::Member),
            Err(CoreError::Forbidden(_))
        ));
    }

    #[test]
    fn name_checks() {
        assert!(validate_organisation_name("Acme").is_ok());
        assert!(validate_organisation_name("   ").is_err());
    }
}

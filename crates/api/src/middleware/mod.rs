//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the caller, from a JWT, an API key or the session cookie.
//! - [`rbac::RequireAdmin`] -- requires the platform `admin` role.
//! - [`rbac::OrgMembership`] -- the caller's role in an organisation.

pub mod auth;
pub mod rbac;

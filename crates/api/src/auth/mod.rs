//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- HS256 access tokens carrying the user's current organisation.

pub mod jwt;
pub mod password;

//! Account passwords: Argon2id hashes in PHC format.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Shortest password accepted at registration, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash `password` with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
}

/// Check `password` against a stored PHC string. A wrong password is
/// `Ok(false)`; only an unparseable hash is an error.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, HashError> {
    let parsed = PasswordHash::new(stored)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(other) => Err(other),
    }
}

/// Length check applied at registration. Counts characters, not bytes.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), String> {
    let length = password.chars().count();
    (length >= min_length)
        .then_some(())
        .ok_or_else(|| format!("Password must be at least {min_length} characters long"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_accepts_only_the_original() {
        let stored = hash_password("correct-horse-battery-staple").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse-battery-staple", &stored).unwrap());
        assert!(!verify_password("correct-horse", &stored).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn unparseable_hash_is_an_error() {
        assert!(verify_password("x", "plaintext-in-the-db").is_err());
    }

    #[test]
    fn length_counts_characters() {
        assert!(validate_password_strength("short", MIN_PASSWORD_LENGTH).is_err());
        assert!(validate_password_strength("eightchr", MIN_PASSWORD_LENGTH).is_ok());
        // Eight characters, sixteen bytes.
        assert!(validate_password_strength("éééééééé", MIN_PASSWORD_LENGTH).is_ok());
        assert!(validate_password_strength("ééé", MIN_PASSWORD_LENGTH).is_err());
    }
}

//! API key generation and hashing.
//!
//! Keys are presented as `Authorization: Bearer lsk_...`. Only the SHA-256
//! digest is stored; the plaintext is shown to the user once.

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Marker prefix on every generated key. Lets the auth layer tell API keys
/// apart from JWT access tokens without a database round trip.
pub const KEY_MARKER: &str = "lsk_";

/// Number of random alphanumeric characters after the marker.
pub const KEY_RANDOM_LENGTH: usize = 40;

/// Number of leading characters stored as a human-visible prefix.
pub const KEY_PREFIX_LENGTH: usize = 12;

/// Maximum length of a key's display name.
pub const MAX_KEY_NAME_LENGTH: usize = 100;

/// The result of generating a new API key.
pub struct GeneratedApiKey {
    /// The plaintext key (shown to the user exactly once, never stored).
    pub plaintext: String,
    /// The first [`KEY_PREFIX_LENGTH`] characters of the key for display.
    pub prefix: String,
    /// The SHA-256 hex digest of the plaintext key (stored in the database).
    pub hash: String,
}

/// Generate a new random API key.
pub fn generate_api_key() -> GeneratedApiKey {
    let random: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(KEY_RANDOM_LENGTH)
        .map(char::from)
        .collect();
    let key = format!("{KEY_MARKER}{random}");

    let prefix = extract_prefix(&key).to_string();
    let hash = hash_api_key(&key);

    GeneratedApiKey {
        plaintext: key,
        prefix,
        hash,
    }
}

/// Compute the SHA-256 hex digest of an API key.
pub fn hash_api_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// Extract the display prefix from a plaintext API key.
pub fn extract_prefix(key: &str) -> &str {
    let end = key
        .char_indices()
        .nth(KEY_PREFIX_LENGTH)
        .map(|(i, _)| i)
        .unwrap_or(key.len());
    &key[..end]
}

/// Whether a bearer credential looks like an API key rather than a JWT.
pub fn is_api_key(token: &str) -> bool {
    token.starts_with(KEY_MARKER)
}

/// Validate a key's display name.
pub fn validate_key_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_KEY_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "name exceeds maximum length of {MAX_KEY_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_has_marker_and_length() {
        let key = generate_api_key();
        assert!(key.plaintext.starts_with(KEY_MARKER));
        assert_eq!(key.plaintext.len(), KEY_MARKER.len() + KEY_RANDOM_LENGTH);
    }

    #[test]
    fn generated_key_prefix_matches_start() {
        let key = generate_api_key();
        assert_eq!(&key.plaintext[..KEY_PREFIX_LENGTH], key.prefix);
    }

    #[test]
    fn hash_matches_regeneration() {
        let key = generate_api_key();
        assert_eq!(key.hash, hash_api_key(&key.plaintext));
        assert_eq!(key.hash.len(), 64);
    }

    #[test]
    fn hash_is_lowercase_sha256_hex() {
        assert_eq!(
            hash_api_key(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn different_keys_produce_different_hashes() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert_ne!(a.plaintext, b.plaintext);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn short_key_prefix_is_whole_key() {
        assert_eq!(extract_prefix("lsk_ab"), "lsk_ab");
    }

    #[test]
    fn jwt_is_not_api_key() {
        assert!(!is_api_key("eyJhbGciOiJIUzI1NiJ9.e30.sig"));
        assert!(is_api_key("lsk_abcdef"));
    }

    #[test]
    fn blank_name_rejected() {
        assert!(validate_key_name("   ").is_err());
        assert!(validate_key_name("ci pipeline").is_ok());
    }
}

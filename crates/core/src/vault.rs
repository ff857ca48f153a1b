//! Vault secrets: key validation and AES-256-GCM encryption at rest.
//!
//! Stored form is `base64(nonce || ciphertext)` with a random 12-byte nonce
//! per value.

use std::fmt;
use std::sync::LazyLock;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::Rng;
use regex::Regex;

use crate::error::CoreError;

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// Maximum length of a secret key name.
pub const MAX_SECRET_KEY_LENGTH: usize = 128;

/// Maximum length of a plaintext secret value.
pub const MAX_SECRET_VALUE_LENGTH: usize = 16_384;

static SECRET_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid regex"));

/// Validate a secret key name.
pub fn validate_secret_key(key: &str) -> Result<(), CoreError> {
    if key.is_empty() || key.len() > MAX_SECRET_KEY_LENGTH {
        return Err(CoreError::Validation(format!(
            "Secret key must be 1 to {MAX_SECRET_KEY_LENGTH} characters"
        )));
    }
    if !SECRET_KEY_RE.is_match(key) {
        return Err(CoreError::Validation(format!(
            "Secret key '{key}' may only contain letters, digits, '_', '.' and '-'"
        )));
    }
    Ok(())
}

/// Validate a plaintext secret value.
pub fn validate_secret_value(value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::Validation(
            "Secret value must not be empty".to_string(),
        ));
    }
    if value.len() > MAX_SECRET_VALUE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Secret value exceeds maximum length of {MAX_SECRET_VALUE_LENGTH} bytes"
        )));
    }
    Ok(())
}

/// Encrypts and decrypts vault values under one master key.
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretCipher(..)")
    }
}

impl SecretCipher {
    /// Build a cipher from a base64-encoded 32-byte key.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CoreError> {
        let bytes = BASE64.decode(encoded.trim()).map_err(|e| {
            CoreError::Validation(format!("Vault key is not valid base64: {e}"))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() != KEY_SIZE {
            return Err(CoreError::Validation(format!(
                "Vault key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Encrypt `plaintext`, returning the stored form.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CoreError> {
        let mut rng = rand::rng();
        let nonce_bytes: [u8; NONCE_SIZE] = std::array::from_fn(|_| rng.random());
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CoreError::Internal(format!("Encryption failed: {e}")))?;

        let mut stored = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        stored.extend_from_slice(&nonce_bytes);
        stored.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(stored))
    }

    /// Decrypt a stored value. Fails on tampering or a different key.
    pub fn decrypt(&self, stored: &str) -> Result<String, CoreError> {
        let bytes = BASE64
            .decode(stored)
            .map_err(|e| CoreError::Internal(format!("Invalid ciphertext encoding: {e}")))?;
        if bytes.len() <= NONCE_SIZE {
            return Err(CoreError::Internal("Ciphertext too short".to_string()));
        }
        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| CoreError::Internal(format!("Decryption failed: {e}")))?;
        String::from_utf8(plaintext)
            .map_err(|e| CoreError::Internal(format!("Decrypted secret is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn cipher(fill: u8) -> SecretCipher {
        SecretCipher::from_bytes(&[fill; KEY_SIZE]).unwrap()
    }

    #[test]
    fn encrypt_then_decrypt_returns_plaintext() {
        let c = cipher(7);
        let stored = c.encrypt("sk-live-123").unwrap();
        assert_ne!(stored, "sk-live-123");
        assert_eq!(c.decrypt(&stored).unwrap(), "sk-live-123");
    }

    #[test]
    fn nonces_differ_between_encryptions() {
        let c = cipher(7);
        assert_ne!(c.encrypt("same").unwrap(), c.encrypt("same").unwrap());
    }

    #[test]
    fn different_key_fails() {
        let stored = cipher(1).encrypt("secret").unwrap();
        assert_matches!(cipher(2).decrypt(&stored), Err(CoreError::Internal(_)));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let c = cipher(3);
        let mut bytes = BASE64.decode(c.encrypt("secret").unwrap()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(c.decrypt(&BASE64.encode(bytes)).is_err());
    }

    #[test]
    fn base64_key_must_be_32_bytes() {
        assert!(SecretCipher::from_base64_key(&BASE64.encode([0u8; 32])).is_ok());
        assert_matches!(
            SecretCipher::from_base64_key(&BASE64.encode([0u8; 16])),
            Err(CoreError::Validation(_))
        );
        assert!(SecretCipher::from_base64_key("not base64!").is_err());
    }

    #[test]
    fn secret_key_pattern() {
        assert!(validate_secret_key("OPENAI_API_KEY").is_ok());
        assert!(validate_secret_key("team.prod-key_2").is_ok());
        assert!(validate_secret_key("").is_err());
        assert!(validate_secret_key("has space").is_err());
        assert!(validate_secret_key(&"k".repeat(MAX_SECRET_KEY_LENGTH + 1)).is_err());
    }
}

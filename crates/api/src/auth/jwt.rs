//! Session tokens.
//!
//! A session is an HS256 JWT carrying [`Claims`]. The `org` claim pins the
//! organisation the session acts in, so switching organisation means
//! issuing a fresh token. Membership is re-checked at switch and login
//! time, not on every request.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use llmscope_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_EXPIRY_MINS: i64 = 60;

/// Payload of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    /// Platform role, `admin` or `member`.
    pub role: String,
    /// Organisation the session acts in.
    #[serde(default)]
    pub org: Option<DbId>,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    fn new(user_id: DbId, role: &str, org: Option<DbId>, lifetime_secs: i64) -> Self {
        let iat = Utc::now().timestamp();
        Self {
            sub: user_id,
            role: role.to_owned(),
            org,
            iat,
            exp: iat + lifetime_secs,
            jti: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Signing secret.
    pub secret: String,
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// `JWT_SECRET` (required, non-empty) and `JWT_ACCESS_EXPIRY_MINS`
    /// (default `60`).
    ///
    /// # Panics
    ///
    /// Panics when the secret is missing or empty, or the expiry is not an
    /// integer.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .expect("JWT_SECRET must be set to a non-empty value");

        let access_token_expiry_mins = match std::env::var("JWT_ACCESS_EXPIRY_MINS") {
            Ok(raw) => raw
                .parse()
                .expect("JWT_ACCESS_EXPIRY_MINS must be an integer"),
            Err(_) => DEFAULT_EXPIRY_MINS,
        };

        Self {
            secret,
            access_token_expiry_mins,
        }
    }

    /// Token lifetime in seconds, as reported to clients.
    pub fn expires_in(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.as_bytes())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.as_bytes())
    }
}

/// Sign a session token for `user_id` acting in `org`.
pub fn generate_access_token(
    user_id: DbId,
    role: &str,
    org: Option<DbId>,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::new(user_id, role, org, config.expires_in());
    encode(&Header::new(Algorithm::HS256), &claims, &config.encoding_key())
}

/// Verify signature and expiry, then return the claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &config.decoding_key(), &validation).map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            access_token_expiry_mins: 15,
        }
    }

    #[test]
    fn claims_survive_signing() {
        let cfg = config("unit-test-secret");
        let token = generate_access_token(42, "admin", Some(7), &cfg).unwrap();
        let claims = validate_token(&token, &cfg).unwrap();

        assert_eq!((claims.sub, claims.role.as_str(), claims.org), (42, "admin", Some(7)));
        assert_eq!(claims.exp - claims.iat, cfg.expires_in());
        assert!(Uuid::parse_str(&claims.jti).is_ok());
    }

    #[test]
    fn org_is_optional() {
        let cfg = config("unit-test-secret");
        let token = generate_access_token(1, "member", None, &cfg).unwrap();
        assert_eq!(validate_token(&token, &cfg).unwrap().org, None);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let cfg = config("unit-test-secret");
        // Expired well beyond the validator's leeway.
        let claims = Claims::new(1, "member", None, -600);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &cfg.encoding_key()).unwrap();
        assert!(validate_token(&token, &cfg).is_err());
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let token = generate_access_token(1, "member", None, &config("alpha")).unwrap();
        assert!(validate_token(&token, &config("bravo")).is_err());
    }
}

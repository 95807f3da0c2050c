//! JWT access-token generation and validation.
//!
//! Tokens are issued by the identity provider and verified here with a
//! shared HS256 secret. [`generate_access_token`] exists for tests and
//! local tooling.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use dealroom_core::types::DbId;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's id.
    pub sub: DbId,
    /// `"buyer"`, `"seller"` or `"admin"`.
    pub role: String,
    /// Deactivated accounts keep valid tokens until expiry; the API rejects
    /// them on this flag.
    #[serde(default = "default_active")]
    pub active: bool,
    pub exp: i64,
    pub iat: i64,
    /// Unique token identifier (UUID v4) for audit.
    pub jti: String,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret shared with the identity provider.
    pub secret: String,
    /// Lifetime of tokens minted by [`generate_access_token`].
    pub access_token_expiry_mins: i64,
}

/// Verifies bearer tokens. Built once at startup and shared via `AppState`.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation: Validation::default(), // HS256, validates exp
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        Ok(decode::<Claims>(token, &self.key, &self.validation)?.claims)
    }
}

/// Mint an HS256 access token.
pub fn generate_access_token(
    user_id: DbId,
    role: &str,
    active: bool,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        active,
        exp: now + config.access_token_expiry_mins * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        }
    }

    #[test]
    fn test_generate_and_verify() {
        let config = test_config();
        let token = generate_access_token(42, "seller", true, &config).unwrap();

        let claims = TokenVerifier::new(&config).verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "seller");
        assert!(claims.active);
        assert!(claims.exp > claims.iat);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_expired_token_fails() {
        let config = test_config();
        // Well beyond the default 60-second leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            role: "buyer".to_string(),
            active: true,
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(TokenVerifier::new(&config).verify(&token).is_err());
    }

    #[test]
    fn test_different_secrets_fail() {
        let config_b = JwtConfig {
            secret: "secret-bravo".to_string(),
            access_token_expiry_mins: 15,
        };
        let token = generate_access_token(1, "buyer", true, &test_config()).unwrap();
        assert!(TokenVerifier::new(&config_b).verify(&token).is_err());
    }

    #[test]
    fn test_missing_active_claim_defaults_to_active() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let token = encode(
            &Header::default(),
            &serde_json::json!({"sub": 3, "role": "buyer", "exp": now + 60, "iat": now, "jti": "x"}),
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();
        assert!(TokenVerifier::new(&config).verify(&token).unwrap().active);
    }
}

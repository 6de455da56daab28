//! Credential hashing and session-token minting.
//!
//! Passwords are stored only as bcrypt hashes. Session tokens are
//! stateless HS256 JWTs bound to the username; there is no server-side
//! session table and no revocation store.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token error: {0}")]
    Token(String),
}

/// Hash a plaintext password with the configured bcrypt work factor.
pub fn hash_password(plain: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(plain, cost).map_err(|e| AuthError::Hash(e.to_string()))
}

/// Compare a plaintext password against a stored bcrypt hash.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(plain, hash).map_err(|e| AuthError::Hash(e.to_string()))
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token is bound to
    pub sub: String,

    /// Issued-at, Unix seconds
    pub iat: u64,

    /// Expiry, Unix seconds
    pub exp: u64,
}

/// Mints and validates opaque bearer tokens.
pub struct TokenMinter {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl TokenMinter {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Mint a bearer token bound to `subject`.
    pub fn mint(&self, subject: &str) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Token(e.to_string()))
    }

    /// Validate a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AuthError::Token(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("hunter2", 4).unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn mint_then_verify_roundtrip() {
        let minter = TokenMinter::new("test-secret", 60);
        let token = minter.mint("alice").unwrap();
        assert!(!token.is_empty());

        let claims = minter.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_foreign_token() {
        let minter = TokenMinter::new("secret-a", 60);
        let other = TokenMinter::new("secret-b", 60);
        let token = other.mint("mallory").unwrap();
        assert!(minter.verify(&token).is_err());
    }
}

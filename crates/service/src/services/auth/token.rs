//! Bearer token issuing and verification.
//!
//! Tokens are HS256 JWTs carrying the user and an issue time. They have no
//! expiry claim; a token is valid only while its session row exists.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::models::User;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    user: User,
    iat: i64,
    /// Unique per token, so two logins in the same second get distinct
    /// session keys.
    jti: Uuid,
}

/// Signs and verifies bearer tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Issue a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let claims = Claims {
            user: user.clone(),
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4(),
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify a token's signature and return the user it carries.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` for malformed or forged tokens.
    pub fn verify(&self, token: &str) -> Result<User, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.user)
            .map_err(|_| AuthError::Unauthenticated)
    }
}

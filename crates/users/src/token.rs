//! Signed access tokens.
//!
//! Tokens are HS256 JSON Web Tokens signed with the configured secret. The
//! claims are `{sub, typ, exp}`: user id, user kind and expiry.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use petlife_core::{UserId, UserKind};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Identity;

/// Errors raised when issuing or verifying a token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not a well-formed JWT or its claims do not decode.
    #[error("malformed token")]
    Malformed,

    /// The signature does not match.
    #[error("invalid token signature")]
    BadSignature,

    /// The token is past its expiry.
    #[error("token expired")]
    Expired,

    /// The token could not be signed.
    #[error("could not sign token")]
    Encode,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::BadSignature,
            _ => Self::Malformed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: UserId,
    typ: UserKind,
    exp: i64,
}

/// Issues and verifies access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer {
    /// Create an issuer signing with `secret`; tokens live for `ttl`.
    #[must_use]
    pub const fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Issue a token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if the claims cannot be signed.
    pub fn issue(&self, id: &UserId, kind: UserKind) -> Result<String, TokenError> {
        let claims = Claims {
            sub: id.clone(),
            typ: kind,
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign access token");
            TokenError::Encode
        })
    }

    /// Verify a token and return the identity it carries.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] if the token is malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let data = decode::<Claims>(token, &key, &validation())?;

        Ok(Identity {
            id: data.claims.sub,
            kind: data.claims.typ,
        })
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    // No clock skew allowance on `exp`.
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}

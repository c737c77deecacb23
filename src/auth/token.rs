//! JWT issuance and verification for session tokens.
//!
//! Access and refresh tokens are both compact HS256 JWS values signed with the
//! same secret. The only structural difference is the `jwt` claim, which a
//! refresh token carries and an access token does not.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::UserId;

/// Lifetime of an access token.
pub const ACCESS_TOKEN_LIFETIME_SECS: i64 = 60 * 60;

/// Lifetime of a refresh token (14 days).
pub const REFRESH_TOKEN_LIFETIME_SECS: i64 = 14 * 24 * 60 * 60;

/// A signed token and the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// An access token together with the refresh token minted alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: Token,
    pub refresh: Token,
}

/// Claims carried by both token kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was issued for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Expiration time (Unix timestamp, seconds).
    pub exp: i64,
    /// Signed access token value; present on refresh tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
    /// Random token id so that two pairs minted in the same second differ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token has no usable id claim")]
    MissingClaim,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Signs and verifies session JWTs with a single process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenCodec {
    /// Create a codec with the standard 1 hour / 14 day lifetimes.
    pub fn new(secret: &str) -> Self {
        Self::with_lifetimes(
            secret,
            Duration::seconds(ACCESS_TOKEN_LIFETIME_SECS),
            Duration::seconds(REFRESH_TOKEN_LIFETIME_SECS),
        )
    }

    /// Create a codec with custom token lifetimes.
    pub fn with_lifetimes(secret: &str, access_lifetime: Duration, refresh_lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_lifetime,
            refresh_lifetime,
        }
    }

    /// Issue a fresh access/refresh pair for `user_id`.
    ///
    /// The access token is signed first so that its value can be embedded in
    /// the refresh token's `jwt` claim.
    pub fn issue(&self, user_id: &UserId) -> Result<TokenPair, TokenError> {
        let now = Utc::now();

        let access = self.sign(user_id, now + self.access_lifetime, None)?;
        let refresh = self.sign(
            user_id,
            now + self.refresh_lifetime,
            Some(access.value.clone()),
        )?;

        Ok(TokenPair { access, refresh })
    }

    fn sign(
        &self,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
        access_value: Option<String>,
    ) -> Result<Token, TokenError> {
        let exp = expires_at.timestamp();
        let claims = Claims {
            id: Some(user_id.as_str().to_string()),
            exp,
            jwt: access_value,
            jti: Some(uuid::Uuid::new_v4().to_string()),
        };

        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        // Report the expiry the token actually carries, truncated to seconds.
        let expires_at = DateTime::from_timestamp(exp, 0).unwrap_or(expires_at);

        Ok(Token { value, expires_at })
    }

    /// Verify signature, algorithm and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }

    /// Verify `token` and return the user id it was issued for.
    pub fn extract_id(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify_with_id(token).map(|(user_id, _)| user_id)
    }

    /// Verify `token`, returning its user id alongside the full claims.
    pub fn verify_with_id(&self, token: &str) -> Result<(UserId, Claims), TokenError> {
        let claims = self.verify(token)?;
        match claims.id.as_deref() {
            Some(id) if !id.is_empty() => Ok((UserId::new(id), claims)),
            _ => Err(TokenError::MissingClaim),
        }
    }
}

/// True iff the claims belong to a refresh token.
pub fn is_refresh_token_claims(claims: &Claims) -> bool {
    claims.jwt.is_some()
}

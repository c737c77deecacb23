use std::sync::Arc;

use chrono::DateTime;
use tracing::{debug, info};

use crate::auth::{
    AuthError, Session, SessionStore, Token, TokenCodec, TokenError, TokenPair, is_refresh_token_claims,
};
use crate::types::UserId;

/// Revoke an access/refresh pair.
///
/// Both tokens must verify, be of the right kind and name the same user.
/// Nothing is deleted unless all of that holds. The refresh token is not
/// required to be the one minted alongside the access token.
#[derive(Clone)]
pub struct Logout {
    codec: Arc<TokenCodec>,
    sessions: SessionStore,
}

impl Logout {
    pub fn new(codec: Arc<TokenCodec>, sessions: SessionStore) -> Self {
        Self { codec, sessions }
    }

    pub async fn execute(&self, access_token: &str, refresh_token: &str) -> Result<(), AuthError> {
        let (access_user, access) = self.decode(access_token, false).map_err(|e| {
            debug!(error = %e, "logout: access token rejected");
            AuthError::InvalidAccessToken
        })?;
        let (refresh_user, refresh) = self.decode(refresh_token, true).map_err(|e| {
            debug!(error = %e, "logout: refresh token rejected");
            AuthError::InvalidRefreshToken
        })?;

        if access_user != refresh_user {
            return Err(AuthError::TokenMismatch);
        }

        let session = Session {
            user_id: access_user,
            tokens: TokenPair { access, refresh },
        };
        self.sessions.delete(&session).await?;

        info!(user_id = %session.user_id, "session logged out");
        Ok(())
    }

    fn decode(&self, value: &str, want_refresh: bool) -> Result<(UserId, Token), TokenError> {
        let (user_id, claims) = self.codec.verify_with_id(value)?;

        if is_refresh_token_claims(&claims) != want_refresh {
            return Err(TokenError::Invalid("wrong token kind".to_string()));
        }

        let token = Token {
            value: value.to_string(),
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_default(),
        };

        Ok((user_id, token))
    }
}

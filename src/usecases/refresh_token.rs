use std::sync::Arc;

use tracing::debug;

use crate::auth::{AuthError, Session, SessionStore, TokenCodec};

use super::issue_session;

/// Exchange a registered refresh token for a brand-new pair.
///
/// The presented pair stays registered until its keys expire.
#[derive(Clone)]
pub struct RefreshToken {
    codec: Arc<TokenCodec>,
    sessions: SessionStore,
}

impl RefreshToken {
    pub fn new(codec: Arc<TokenCodec>, sessions: SessionStore) -> Self {
        Self { codec, sessions }
    }

    pub async fn execute(&self, refresh_token: &str) -> Result<Session, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::TokenNotSet);
        }

        let user_id = self.codec.extract_id(refresh_token).map_err(|e| {
            debug!(error = %e, "refresh token rejected");
            AuthError::TokenInvalid
        })?;

        if !self.sessions.refresh_token_exists(&user_id, refresh_token).await? {
            return Err(AuthError::TokenNotFound);
        }

        issue_session(&self.codec, &self.sessions, user_id).await
    }
}

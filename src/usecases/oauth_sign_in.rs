use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{AuthError, Session, SessionStore, TokenCodec, UserRepository};
use crate::types::{AuthProvider, Email, ExternalUserId};

use super::issue_session;

/// Identity asserted by an external provider after a completed OAuth flow.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthPayload {
    pub provider: AuthProvider,
    pub external_uid: ExternalUserId,
    #[serde(default)]
    pub email: Option<Email>,
}

#[derive(Debug, Clone, Error)]
pub enum OAuthExchangeError {
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("authorization code rejected: {0}")]
    Rejected(String),
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl From<OAuthExchangeError> for AuthError {
    fn from(err: OAuthExchangeError) -> Self {
        match err {
            OAuthExchangeError::UnsupportedProvider(_) | OAuthExchangeError::Rejected(_) => {
                AuthError::OAuthRejected
            }
            OAuthExchangeError::Unavailable(reason) => AuthError::OAuthProvider(reason),
        }
    }
}

pub type ExchangeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<OAuthPayload, OAuthExchangeError>> + Send + 'a>>;

/// Provider side of the OAuth flow.
///
/// Redeems an authorization code with the named provider and returns the
/// identity the provider vouches for. This is the only source of an
/// `OAuthPayload` on the HTTP surface.
pub trait OAuthExchange: Send + Sync {
    fn exchange<'a>(&'a self, provider: &'a AuthProvider, code: &'a str) -> ExchangeFuture<'a>;
}

/// Sign in through an external identity, creating the user on first use.
#[derive(Clone)]
pub struct OAuthSignIn {
    users: Arc<dyn UserRepository>,
    codec: Arc<TokenCodec>,
    sessions: SessionStore,
}

impl OAuthSignIn {
    pub fn new(users: Arc<dyn UserRepository>, codec: Arc<TokenCodec>, sessions: SessionStore) -> Self {
        Self {
            users,
            codec,
            sessions,
        }
    }

    pub async fn execute(&self, payload: OAuthPayload) -> Result<Session, AuthError> {
        if payload.provider.is_empty() || payload.external_uid.is_empty() {
            return Err(AuthError::InvalidOAuthPayload);
        }

        let user = self
            .users
            .find_or_create_oauth_user(&payload.provider, &payload.external_uid, payload.email.as_ref())
            .await?;

        info!(user_id = %user.id, provider = %payload.provider, "oauth sign-in");
        issue_session(&self.codec, &self.sessions, user.id).await
    }

    /// Redeem `code` with `exchange`, then sign in as the returned identity.
    ///
    /// The identity must come from the provider the caller named.
    pub async fn callback(
        &self,
        exchange: &dyn OAuthExchange,
        provider: &AuthProvider,
        code: &str,
    ) -> Result<Session, AuthError> {
        if provider.is_empty() || code.is_empty() {
            return Err(AuthError::InvalidOAuthPayload);
        }

        let payload = exchange.exchange(provider, code).await.map_err(|e| {
            if let OAuthExchangeError::Unavailable(_) = e {
                warn!(provider = %provider, error = %e, "oauth exchange failed");
            } else {
                debug!(provider = %provider, error = %e, "oauth exchange rejected");
            }
            AuthError::from(e)
        })?;

        if payload.provider != *provider {
            debug!(
                requested = %provider,
                returned = %payload.provider,
                "oauth exchange returned another provider"
            );
            return Err(AuthError::OAuthRejected);
        }

        self.execute(payload).await
    }
}

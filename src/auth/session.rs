//! Session registry backed by a key-value store.
//!
//! A session has no record of its own. It exists as two independent keys, one
//! per token, each expiring with its token. Key presence is what makes a
//! token usable; deleting a key revokes the token even though its signature
//! stays valid until `exp`.
//!
//! `create` and `delete` are two separate store calls with no rollback. If the
//! second call fails the first key stays behind until its TTL lapses.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::token::TokenPair;
use crate::kvs::{KeyValueStore, KvsError};
use crate::types::UserId;

/// A user's registered token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Error)]
pub enum SessionStoreError {
    #[error("empty value")]
    EmptyValue,
    #[error("token already expired")]
    AlreadyExpired,
    #[error(transparent)]
    Kvs(#[from] KvsError),
}

/// Key under which an access token is registered.
pub fn access_token_key(user_id: &UserId, token: &str) -> String {
    format!("session:{}:access_token:{}", user_id, token)
}

/// Key under which a refresh token is registered.
pub fn refresh_token_key(user_id: &UserId, token: &str) -> String {
    format!("session:{}:refresh_token:{}", user_id, token)
}

#[derive(Clone)]
pub struct SessionStore {
    kvs: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(kvs: Arc<dyn KeyValueStore>) -> Self {
        Self { kvs }
    }

    /// Register both tokens of `session`, each for its remaining lifetime.
    pub async fn create(&self, session: &Session) -> Result<(), SessionStoreError> {
        let access = &session.tokens.access;
        let refresh = &session.tokens.refresh;

        if session.user_id.is_empty() || access.value.is_empty() || refresh.value.is_empty() {
            return Err(SessionStoreError::EmptyValue);
        }

        let now = Utc::now();

        self.kvs
            .set(
                &access_token_key(&session.user_id, &access.value),
                &access.value,
                remaining(access.expires_at, now)?,
            )
            .await?;

        self.kvs
            .set(
                &refresh_token_key(&session.user_id, &refresh.value),
                &refresh.value,
                remaining(refresh.expires_at, now)?,
            )
            .await
            .inspect_err(|e| {
                warn!(user_id = %session.user_id, error = %e, "refresh key not stored; access key left in place");
            })?;

        debug!(user_id = %session.user_id, "session registered");
        Ok(())
    }

    /// Unregister both tokens of `session`.
    ///
    /// Both deletions are attempted; the first failure is returned.
    pub async fn delete(&self, session: &Session) -> Result<(), SessionStoreError> {
        let access = self
            .kvs
            .delete(&access_token_key(&session.user_id, &session.tokens.access.value))
            .await;
        let refresh = self
            .kvs
            .delete(&refresh_token_key(&session.user_id, &session.tokens.refresh.value))
            .await;

        access?;
        refresh?;

        debug!(user_id = %session.user_id, "session revoked");
        Ok(())
    }

    pub async fn access_token_exists(&self, user_id: &UserId, token: &str) -> Result<bool, SessionStoreError> {
        let count = self.kvs.exists(&access_token_key(user_id, token)).await?;
        Ok(count == 1)
    }

    pub async fn refresh_token_exists(&self, user_id: &UserId, token: &str) -> Result<bool, SessionStoreError> {
        let count = self.kvs.exists(&refresh_token_key(user_id, token)).await?;
        Ok(count == 1)
    }
}

fn remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<Duration, SessionStoreError> {
    (expires_at - now)
        .to_std()
        .ok()
        .filter(|ttl| !ttl.is_zero())
        .ok_or(SessionStoreError::AlreadyExpired)
}

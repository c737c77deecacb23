use std::sync::Arc;

use tracing::debug;

use crate::auth::password::{verify_dummy, verify_password};
use crate::auth::{AuthError, Session, SessionStore, TokenCodec, UserRepository};
use crate::types::Email;

use super::issue_session;

/// Email/password sign-in.
#[derive(Clone)]
pub struct CreateSession {
    users: Arc<dyn UserRepository>,
    codec: Arc<TokenCodec>,
    sessions: SessionStore,
}

impl CreateSession {
    pub fn new(users: Arc<dyn UserRepository>, codec: Arc<TokenCodec>, sessions: SessionStore) -> Self {
        Self {
            users,
            codec,
            sessions,
        }
    }

    /// Verify the credentials and register a fresh token pair.
    ///
    /// An unknown email, a user without a password credential and a wrong
    /// password all fail with `PasswordNotMatch`, and all pay for one Argon2
    /// verification.
    pub async fn execute(&self, email: &Email, password: &str) -> Result<Session, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            debug!(email = %email, "sign-in for unknown email");
            verify_dummy(password);
            return Err(AuthError::PasswordNotMatch);
        };

        let Some(hash) = self.users.find_password_hash(&user.id).await? else {
            debug!(user_id = %user.id, "sign-in for user without password");
            verify_dummy(password);
            return Err(AuthError::PasswordNotMatch);
        };

        if !verify_password(&hash, password) {
            debug!(user_id = %user.id, "password mismatch");
            return Err(AuthError::PasswordNotMatch);
        }

        issue_session(&self.codec, &self.sessions, user.id).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::usecases::testing::{InMemoryUsers, codec_and_sessions};

    fn sign_in(users: InMemoryUsers) -> (CreateSession, SessionStore) {
        let (codec, sessions) = codec_and_sessions();
        (CreateSession::new(Arc::new(users), codec, sessions.clone()), sessions)
    }

    #[tokio::test]
    async fn test_sign_in_registers_pair() {
        let users = InMemoryUsers::new();
        users.add_user("u1", "ann@example.com", Some("hunter2"));
        let (uc, sessions) = sign_in(users);

        let session = uc.execute(&Email::new("ann@example.com"), "hunter2").await.unwrap();

        assert_eq!(session.user_id.as_str(), "u1");
        assert!(sessions
            .access_token_exists(&session.user_id, &session.tokens.access.value)
            .await
            .unwrap());
        assert!(sessions
            .refresh_token_exists(&session.user_id, &session.tokens.refresh.value)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let users = InMemoryUsers::new();
        users.add_user("u1", "ann@example.com", Some("hunter2"));
        let (uc, _) = sign_in(users);

        assert!(matches!(
            uc.execute(&Email::new("ann@example.com"), "hunter3").await,
            Err(AuthError::PasswordNotMatch)
        ));
    }

    #[tokio::test]
    async fn test_unknown_email_and_missing_credential_look_the_same() {
        let users = InMemoryUsers::new();
        users.add_user("u2", "oauth-only@example.com", None);
        let (uc, _) = sign_in(users);

        assert!(matches!(
            uc.execute(&Email::new("nobody@example.com"), "x").await,
            Err(AuthError::PasswordNotMatch)
        ));
        assert!(matches!(
            uc.execute(&Email::new("oauth-only@example.com"), "x").await,
            Err(AuthError::PasswordNotMatch)
        ));
    }

    #[tokio::test]
    async fn test_unknown_email_costs_a_verification() {
        let users = InMemoryUsers::new();
        users.add_user("u1", "ann@example.com", Some("hunter2"));
        let (uc, _) = sign_in(users);

        // Warm up the placeholder hash.
        let _ = uc.execute(&Email::new("nobody@example.com"), "x").await;

        let started = Instant::now();
        let _ = uc.execute(&Email::new("ann@example.com"), "wrong").await;
        let wrong_password = started.elapsed();

        let started = Instant::now();
        let _ = uc.execute(&Email::new("nobody@example.com"), "wrong").await;
        let unknown_email = started.elapsed();

        assert!(
            unknown_email * 4 >= wrong_password,
            "unknown email took {:?}, wrong password took {:?}",
            unknown_email,
            wrong_password
        );
    }
}

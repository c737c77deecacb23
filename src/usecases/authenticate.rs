use std::sync::Arc;

use tracing::debug;

use crate::auth::{AuthError, SessionStore, TokenCodec, User, UserRepository};
use crate::types::UserId;

/// Resolve an access token to the user id it was issued for.
///
/// A token passes only if its signature verifies, it has not expired and it
/// is registered under the access key. Expired and malformed tokens are both
/// reported as `TokenInvalid`.
#[derive(Clone)]
pub struct Authenticate {
    codec: Arc<TokenCodec>,
    sessions: SessionStore,
}

impl Authenticate {
    pub fn new(codec: Arc<TokenCodec>, sessions: SessionStore) -> Self {
        Self { codec, sessions }
    }

    pub async fn execute(&self, access_token: &str) -> Result<UserId, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::TokenNotSet);
        }

        let user_id = self.codec.extract_id(access_token).map_err(|e| {
            debug!(error = %e, "access token rejected");
            AuthError::TokenInvalid
        })?;

        if !self.sessions.access_token_exists(&user_id, access_token).await? {
            return Err(AuthError::SessionNotFound);
        }

        Ok(user_id)
    }
}

/// `Authenticate`, then load the user the token belongs to.
#[derive(Clone)]
pub struct AuthenticateUser {
    authenticate: Authenticate,
    users: Arc<dyn UserRepository>,
}

impl AuthenticateUser {
    pub fn new(authenticate: Authenticate, users: Arc<dyn UserRepository>) -> Self {
        Self { authenticate, users }
    }

    pub async fn execute(&self, access_token: &str) -> Result<User, AuthError> {
        let user_id = self.authenticate.execute(access_token).await?;

        self.users
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use crate::usecases::testing::{InMemoryUsers, codec_and_sessions};
    use chrono::Duration;

    async fn registered_session(codec: &TokenCodec, sessions: &SessionStore, user: &str) -> Session {
        let user_id = UserId::new(user);
        let session = Session {
            tokens: codec.issue(&user_id).unwrap(),
            user_id,
        };
        sessions.create(&session).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_registered_access_token_authenticates() {
        let (codec, sessions) = codec_and_sessions();
        let session = registered_session(&codec, &sessions, "u1").await;
        let authenticate = Authenticate::new(codec, sessions);

        let user_id = authenticate.execute(&session.tokens.access.value).await.unwrap();
        assert_eq!(user_id.as_str(), "u1");
    }

    #[tokio::test]
    async fn test_empty_token() {
        let (codec, sessions) = codec_and_sessions();
        let authenticate = Authenticate::new(codec, sessions);

        assert!(matches!(authenticate.execute("").await, Err(AuthError::TokenNotSet)));
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let (codec, sessions) = codec_and_sessions();
        let authenticate = Authenticate::new(codec, sessions);

        assert!(matches!(
            authenticate.execute("not-a-jwt").await,
            Err(AuthError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_is_reported_as_invalid() {
        let (_, sessions) = codec_and_sessions();
        let codec = Arc::new(TokenCodec::with_lifetimes(
            "use-case-test-secret",
            Duration::seconds(-5),
            Duration::days(1),
        ));
        let pair = codec.issue(&UserId::new("u1")).unwrap();
        let authenticate = Authenticate::new(codec, sessions);

        assert!(matches!(
            authenticate.execute(&pair.access.value).await,
            Err(AuthError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn test_unregistered_token() {
        let (codec, sessions) = codec_and_sessions();
        let pair = codec.issue(&UserId::new("u1")).unwrap();
        let authenticate = Authenticate::new(codec, sessions);

        assert!(matches!(
            authenticate.execute(&pair.access.value).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_authenticate() {
        let (codec, sessions) = codec_and_sessions();
        let session = registered_session(&codec, &sessions, "u1").await;
        let authenticate = Authenticate::new(codec, sessions);

        assert!(matches!(
            authenticate.execute(&session.tokens.refresh.value).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_authenticate_user_loads_user() {
        let (codec, sessions) = codec_and_sessions();
        let users = InMemoryUsers::new();
        users.add_user("u1", "ann@example.com", None);
        let session = registered_session(&codec, &sessions, "u1").await;

        let uc = AuthenticateUser::new(Authenticate::new(codec, sessions), Arc::new(users));
        let user = uc.execute(&session.tokens.access.value).await.unwrap();

        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.email.unwrap().as_str(), "ann@example.com");
    }

    #[tokio::test]
    async fn test_authenticate_user_missing_user() {
        let (codec, sessions) = codec_and_sessions();
        let users = InMemoryUsers::new();
        users.add_user("u1", "ann@example.com", None);
        let session = registered_session(&codec, &sessions, "u1").await;
        users.remove_user("u1");

        let uc = AuthenticateUser::new(Authenticate::new(codec, sessions), Arc::new(users));
        assert!(matches!(
            uc.execute(&session.tokens.access.value).await,
            Err(AuthError::UserNotFound)
        ));
    }
}

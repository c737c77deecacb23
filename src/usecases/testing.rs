//! In-memory collaborators for use-case tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::auth::password::hash_password;
use crate::auth::{RepoFuture, RepositoryError, SessionStore, TokenCodec, User, UserRepository};
use crate::kvs::MemoryStore;
use crate::types::{AuthProvider, Email, ExternalUserId, UserId};
use crate::usecases::{ExchangeFuture, OAuthExchange, OAuthExchangeError, OAuthPayload};

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    password_hashes: HashMap<String, String>,
    oauth_links: HashMap<(String, String), String>,
}

/// `UserRepository` over plain maps.
#[derive(Clone, Default)]
pub struct InMemoryUsers {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user, optionally with a password credential.
    pub fn add_user(&self, id: &str, email: &str, password: Option<&str>) -> User {
        let user = User {
            id: UserId::new(id),
            email: Some(Email::new(email)),
            display_name: None,
        };

        let mut inner = self.inner.lock().unwrap();
        inner.users.insert(id.to_string(), user.clone());
        if let Some(password) = password {
            inner
                .password_hashes
                .insert(id.to_string(), hash_password(password).unwrap());
        }
        user
    }

    pub fn remove_user(&self, id: &str) {
        self.inner.lock().unwrap().users.remove(id);
    }
}

impl UserRepository for InMemoryUsers {
    fn find_by_id(&self, id: &UserId) -> RepoFuture<'_, Option<User>> {
        let found = self.inner.lock().unwrap().users.get(id.as_str()).cloned();
        Box::pin(async move { Ok(found) })
    }

    fn find_by_email(&self, email: &Email) -> RepoFuture<'_, Option<User>> {
        let found = self
            .inner
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.email.as_ref() == Some(email))
            .cloned();
        Box::pin(async move { Ok(found) })
    }

    fn find_password_hash(&self, id: &UserId) -> RepoFuture<'_, Option<String>> {
        let found = self.inner.lock().unwrap().password_hashes.get(id.as_str()).cloned();
        Box::pin(async move { Ok(found) })
    }

    fn find_or_create_oauth_user(
        &self,
        provider: &AuthProvider,
        external_uid: &ExternalUserId,
        email: Option<&Email>,
    ) -> RepoFuture<'_, User> {
        let mut inner = self.inner.lock().unwrap();
        let link = (provider.as_str().to_string(), external_uid.as_str().to_string());

        let user = match inner.oauth_links.get(&link).cloned() {
            Some(uid) => inner
                .users
                .get(&uid)
                .cloned()
                .ok_or_else(|| RepositoryError::Database("dangling link".to_string())),
            None => {
                let user = User {
                    id: UserId::generate(),
                    email: email.cloned(),
                    display_name: None,
                };
                inner.users.insert(user.id.as_str().to_string(), user.clone());
                inner.oauth_links.insert(link, user.id.as_str().to_string());
                Ok(user)
            }
        };

        Box::pin(async move { user })
    }
}

/// Codec and a fresh in-memory session store.
pub fn codec_and_sessions() -> (Arc<TokenCodec>, SessionStore) {
    (
        Arc::new(TokenCodec::new("use-case-test-secret")),
        SessionStore::new(Arc::new(MemoryStore::new())),
    )
}

/// `OAuthExchange` that accepts one authorization code for one provider.
pub struct StubExchange {
    provider: String,
    answer_as: String,
    code: String,
    subject: String,
    available: bool,
}

impl StubExchange {
    pub fn new(provider: &str, code: &str, subject: &str) -> Self {
        Self {
            provider: provider.to_string(),
            answer_as: provider.to_string(),
            code: code.to_string(),
            subject: subject.to_string(),
            available: true,
        }
    }

    /// Report identities as coming from `provider` instead.
    pub fn answering_as(mut self, provider: &str) -> Self {
        self.answer_as = provider.to_string();
        self
    }

    /// An exchange whose provider cannot be reached.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new("google", "good-code", "sub")
        }
    }
}

impl OAuthExchange for StubExchange {
    fn exchange<'a>(&'a self, provider: &'a AuthProvider, code: &'a str) -> ExchangeFuture<'a> {
        let result = if !self.available {
            Err(OAuthExchangeError::Unavailable("connection refused".to_string()))
        } else if provider.as_str() != self.provider {
            Err(OAuthExchangeError::UnsupportedProvider(provider.to_string()))
        } else if code != self.code {
            Err(OAuthExchangeError::Rejected("invalid_grant".to_string()))
        } else {
            Ok(OAuthPayload {
                provider: AuthProvider::new(&self.answer_as),
                external_uid: ExternalUserId::new(&self.subject),
                email: Some(Email::new(format!("{}@example.com", self.subject))),
            })
        };

        Box::pin(async move { result })
    }
}

//! User and credential storage.
//!
//! The session subsystem only needs a narrow read interface over users; the
//! SurrealDB implementation here also covers account creation for the CLI
//! and OAuth first sign-in.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::db::Db;
use crate::db::schema::{CredentialKind, CredentialRecord, UserCreate, UserRecord};
use crate::types::{AuthProvider, Email, ExternalUserId, UserId};

/// A user account as seen by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Option<Email>,
    pub display_name: Option<String>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: UserId::new(record.uid),
            email: record.email.map(Email::new),
            display_name: record.display_name,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<surrealdb::Error> for RepositoryError {
    fn from(err: surrealdb::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Boxed future returned by [`UserRepository`] operations.
pub type RepoFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send + 'a>>;

/// Read access to users and their sign-in credentials.
pub trait UserRepository: Send + Sync {
    fn find_by_id(&self, id: &UserId) -> RepoFuture<'_, Option<User>>;

    fn find_by_email(&self, email: &Email) -> RepoFuture<'_, Option<User>>;

    /// PHC hash of the user's password credential, if they have one.
    fn find_password_hash(&self, id: &UserId) -> RepoFuture<'_, Option<String>>;

    /// Return the user linked to `(provider, external_uid)`, creating the
    /// account and link on first sight.
    fn find_or_create_oauth_user(
        &self,
        provider: &AuthProvider,
        external_uid: &ExternalUserId,
        email: Option<&Email>,
    ) -> RepoFuture<'_, User>;
}

/// SurrealDB-backed user store.
#[derive(Clone)]
pub struct UserStore {
    db: Db,
}

const USER_FIELDS: &str = "uid, email, display_name";
const CREDENTIAL_FIELDS: &str = "user_uid, kind, password_hash, provider, external_uid";

impl UserStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    async fn select_user(&self, field: &'static str, value: String) -> Result<Option<User>, RepositoryError> {
        let query = format!("SELECT {USER_FIELDS} FROM user WHERE {field} = $value LIMIT 1");

        let mut res = self.db.query(query).bind(("value", value)).await?;

        let users: Vec<UserRecord> = res.take(0)?;
        Ok(users.into_iter().next().map(User::from))
    }

    async fn insert_user(&self, create: UserCreate) -> Result<User, RepositoryError> {
        let query = r#"
            CREATE user CONTENT {
                uid: $uid,
                email: $email,
                display_name: $display_name,
                created_at: time::now()
            }
        "#;

        self.db
            .query(query)
            .bind(("uid", create.uid.clone()))
            .bind(("email", create.email.clone()))
            .bind(("display_name", create.display_name.clone()))
            .await?
            .check()?;

        Ok(User::from(UserRecord {
            uid: create.uid,
            email: create.email,
            display_name: create.display_name,
        }))
    }

    async fn insert_credential(&self, credential: CredentialRecord) -> Result<(), RepositoryError> {
        let query = r#"
            CREATE credential CONTENT {
                user_uid: $user_uid,
                kind: $kind,
                password_hash: $password_hash,
                provider: $provider,
                external_uid: $external_uid,
                created_at: time::now()
            }
        "#;

        self.db
            .query(query)
            .bind(("user_uid", credential.user_uid))
            .bind(("kind", credential.kind))
            .bind(("password_hash", credential.password_hash))
            .bind(("provider", credential.provider))
            .bind(("external_uid", credential.external_uid))
            .await?
            .check()?;

        Ok(())
    }

    async fn select_password_hash(&self, uid: String) -> Result<Option<String>, RepositoryError> {
        let query = format!(
            "SELECT {CREDENTIAL_FIELDS} FROM credential \
             WHERE user_uid = $uid AND kind = 'password' LIMIT 1"
        );

        let mut res = self.db.query(query).bind(("uid", uid)).await?;

        let credentials: Vec<CredentialRecord> = res.take(0)?;
        Ok(credentials.into_iter().next().and_then(|c| c.password_hash))
    }

    async fn oauth_user(
        &self,
        provider: String,
        external_uid: String,
        email: Option<String>,
    ) -> Result<User, RepositoryError> {
        let query = format!(
            "SELECT {CREDENTIAL_FIELDS} FROM credential \
             WHERE kind = 'oauth' AND provider = $provider AND external_uid = $external_uid LIMIT 1"
        );

        let mut res = self
            .db
            .query(query)
            .bind(("provider", provider.clone()))
            .bind(("external_uid", external_uid.clone()))
            .await?;

        let linked: Vec<CredentialRecord> = res.take(0)?;
        if let Some(credential) = linked.into_iter().next() {
            return self
                .select_user("uid", credential.user_uid.clone())
                .await?
                .ok_or_else(|| {
                    RepositoryError::Database(format!(
                        "credential references missing user {}",
                        credential.user_uid
                    ))
                });
        }

        let user = self
            .insert_user(UserCreate {
                uid: UserId::generate().into_inner(),
                email,
                display_name: None,
            })
            .await?;

        self.insert_credential(CredentialRecord {
            user_uid: user.id.as_str().to_string(),
            kind: CredentialKind::Oauth,
            password_hash: None,
            provider: Some(provider.clone()),
            external_uid: Some(external_uid),
        })
        .await?;

        info!(user_id = %user.id, provider = %provider, "created oauth user");
        Ok(user)
    }

    /// Create a user with a password credential.
    ///
    /// `password_hash` must already be a PHC string (see `auth::password`).
    pub async fn create_password_user(
        &self,
        email: &Email,
        password_hash: String,
        display_name: Option<String>,
    ) -> Result<User, RepositoryError> {
        if self.select_user("email", email.as_str().to_string()).await?.is_some() {
            return Err(RepositoryError::Conflict(format!("email {} is already registered", email)));
        }

        let user = self
            .insert_user(UserCreate {
                uid: UserId::generate().into_inner(),
                email: Some(email.as_str().to_string()),
                display_name,
            })
            .await?;

        self.insert_credential(CredentialRecord {
            user_uid: user.id.as_str().to_string(),
            kind: CredentialKind::Password,
            password_hash: Some(password_hash),
            provider: None,
            external_uid: None,
        })
        .await?;

        info!(user_id = %user.id, "created password user");
        Ok(user)
    }
}

impl UserRepository for UserStore {
    fn find_by_id(&self, id: &UserId) -> RepoFuture<'_, Option<User>> {
        let value = id.as_str().to_string();
        Box::pin(async move { self.select_user("uid", value).await })
    }

    fn find_by_email(&self, email: &Email) -> RepoFuture<'_, Option<User>> {
        let value = email.as_str().to_string();
        Box::pin(async move { self.select_user("email", value).await })
    }

    fn find_password_hash(&self, id: &UserId) -> RepoFuture<'_, Option<String>> {
        Box::pin(self.select_password_hash(id.as_str().to_string()))
    }

    fn find_or_create_oauth_user(
        &self,
        provider: &AuthProvider,
        external_uid: &ExternalUserId,
        email: Option<&Email>,
    ) -> RepoFuture<'_, User> {
        Box::pin(self.oauth_user(
            provider.as_str().to_string(),
            external_uid.as_str().to_string(),
            email.map(|e| e.as_str().to_string()),
        ))
    }
}

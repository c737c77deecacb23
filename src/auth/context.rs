//! Request-scoped identity attached by the authentication gate.

use crate::auth::user_store::User;
use crate::types::UserId;

/// Authenticated caller of a gated RPC.
///
/// Inserted into the request extensions once the access token has been
/// verified and found registered. It is immutable once created.
#[derive(Debug, Clone)]
pub struct Principal {
    user: User,
    /// The access token the request was authenticated with.
    access_token: String,
}

impl Principal {
    pub fn new(user: User, access_token: impl Into<String>) -> Self {
        Self {
            user,
            access_token: access_token.into(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Get a display-friendly name for this user.
    pub fn display(&self) -> String {
        if let Some(name) = &self.user.display_name {
            name.clone()
        } else if let Some(email) = &self.user.email {
            email.to_string()
        } else {
            self.user.id.to_string()
        }
    }
}

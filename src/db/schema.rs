use serde::{Deserialize, Serialize};

/// Persisted representation of a user account (table: `user`).
///
/// Rows are addressed by the `uid` field rather than the SurrealDB record id,
/// so the same string can travel in token claims and session keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Application-level user id.
    pub uid: String,
    /// Email used for password sign-in, if any.
    pub email: Option<String>,
    /// Optional display name
    pub display_name: Option<String>,
}

/// Payload used when inserting a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Kind of sign-in credential attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Password,
    Oauth,
}

/// Persisted sign-in credential (table: `credential`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Owning user's `uid`.
    pub user_uid: String,
    pub kind: CredentialKind,
    /// Argon2 PHC string; password credentials only.
    pub password_hash: Option<String>,
    /// OAuth provider name; OAuth credentials only.
    pub provider: Option<String>,
    /// Provider-assigned subject; OAuth credentials only.
    pub external_uid: Option<String>,
}

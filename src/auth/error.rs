//! Authentication and session errors.

use thiserror::Error;

use crate::auth::session::SessionStoreError;
use crate::auth::token::TokenError;
use crate::auth::user_store::RepositoryError;

/// Failures surfaced by the session use-cases and the request gate.
///
/// The client-facing variants are intentionally coarse: an expired token and
/// a forged one both report `TokenInvalid`, and sign-in never reveals whether
/// the email exists.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("token is not set")]
    TokenNotSet,
    #[error("token is invalid")]
    TokenInvalid,
    #[error("session not found")]
    SessionNotFound,
    #[error("token not found")]
    TokenNotFound,
    #[error("access token and refresh token belong to different users")]
    TokenMismatch,
    #[error("access token is invalid")]
    InvalidAccessToken,
    #[error("refresh token is invalid")]
    InvalidRefreshToken,
    #[error("email or password does not match")]
    PasswordNotMatch,
    #[error("no access token found")]
    NoAccessToken,
    #[error("user not found")]
    UserNotFound,
    #[error("oauth payload is missing provider or subject")]
    InvalidOAuthPayload,
    #[error("oauth authorization was rejected")]
    OAuthRejected,
    #[error("session store failure: {0}")]
    Session(#[from] SessionStoreError),
    #[error("token signing failure: {0}")]
    Signing(TokenError),
    #[error("user repository failure: {0}")]
    Repository(#[from] RepositoryError),
    #[error("oauth provider failure: {0}")]
    OAuthProvider(String),
}

impl AuthError {
    /// Stable identifier used as the i18n message id and the RPC `reason`.
    pub fn message_id(&self) -> &'static str {
        match self {
            Self::TokenNotSet => "token_not_set",
            Self::TokenInvalid => "token_invalid",
            Self::SessionNotFound => "session_not_found",
            Self::TokenNotFound => "token_not_found",
            Self::TokenMismatch => "token_mismatch",
            Self::InvalidAccessToken => "invalid_access_token",
            Self::InvalidRefreshToken => "invalid_refresh_token",
            Self::PasswordNotMatch => "password_not_match",
            Self::NoAccessToken => "no_access_token",
            Self::UserNotFound => "user_not_found",
            Self::InvalidOAuthPayload => "invalid_oauth_payload",
            Self::OAuthRejected => "oauth_rejected",
            Self::Session(_) | Self::Signing(_) | Self::Repository(_) | Self::OAuthProvider(_) => {
                "internal"
            }
        }
    }

    /// True for infrastructure failures that are not the caller's fault.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Session(_) | Self::Signing(_) | Self::Repository(_) | Self::OAuthProvider(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kvs::KvsError;

    #[test]
    fn test_message_ids_are_stable() {
        assert_eq!(AuthError::TokenNotSet.message_id(), "token_not_set");
        assert_eq!(AuthError::NoAccessToken.message_id(), "no_access_token");
        assert_eq!(AuthError::TokenMismatch.message_id(), "token_mismatch");
    }

    #[test]
    fn test_infrastructure_errors_are_internal() {
        let err = AuthError::from(SessionStoreError::Kvs(KvsError::Backend("down".into())));
        assert!(err.is_internal());
        assert_eq!(err.message_id(), "internal");
        assert!(!AuthError::SessionNotFound.is_internal());
        assert!(AuthError::OAuthProvider("timeout".into()).is_internal());
        assert!(!AuthError::OAuthRejected.is_internal());
    }

    #[test]
    fn test_display() {
        assert_eq!(AuthError::NoAccessToken.to_string(), "no access token found");
        assert_eq!(
            AuthError::PasswordNotMatch.to_string(),
            "email or password does not match"
        );
    }
}

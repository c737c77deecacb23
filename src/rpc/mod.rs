//! Connect-style unary RPC plumbing: procedure paths, the error envelope and
//! the interceptor chain that every procedure runs through.

pub mod cookie;
pub mod interceptors;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::auth::AuthError;
use crate::i18n::{Catalog, Language, Localize};

pub const SIGN_IN: &str = "/auth.v1.AuthService/SignIn";
pub const REFRESH_TOKEN: &str = "/auth.v1.AuthService/RefreshToken";
pub const SIGN_OUT: &str = "/auth.v1.AuthService/SignOut";
pub const OAUTH_CALLBACK: &str = "/auth.v1.AuthService/OAuthCallback";
pub const GET_ME: &str = "/user.v1.UserService/GetMe";

/// Procedures reachable without an access token.
pub const SKIP_AUTHENTICATION: &[&str] = &[SIGN_IN, OAUTH_CALLBACK, REFRESH_TOKEN];

/// Reason used when a request body cannot be decoded.
pub const INVALID_REQUEST: &str = "invalid_request";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcCode {
    Unauthenticated,
    InvalidArgument,
    Internal,
}

impl RpcCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidArgument => "invalid_argument",
            Self::Internal => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidArgument => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error envelope returned by every procedure.
///
/// `reason` is a stable message id; `message` is the human-readable text,
/// re-rendered per request language by the localization interceptor. The
/// response produced by `into_response` carries a copy of the error in its
/// extensions so outer layers can inspect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: RpcCode,
    pub message: String,
    pub reason: String,
}

impl RpcError {
    pub fn new(code: RpcCode, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            code,
            message: Catalog.localize(Language::default(), &reason),
            reason,
        }
    }

    /// Reject with `Unauthenticated`, keeping the specific reason.
    pub fn unauthenticated(err: &AuthError) -> Self {
        Self::new(RpcCode::Unauthenticated, err.message_id())
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::new(RpcCode::InvalidArgument, reason)
    }

    pub fn internal() -> Self {
        Self::new(RpcCode::Internal, "internal")
    }

    /// Copy of `self` with `message` rendered in `language`.
    pub fn localized(&self, localizer: &dyn Localize, language: Language) -> Self {
        Self {
            code: self.code,
            message: localizer.localize(language, &self.reason),
            reason: self.reason.clone(),
        }
    }
}

impl From<AuthError> for RpcError {
    fn from(err: AuthError) -> Self {
        let code = match &err {
            AuthError::Session(_)
            | AuthError::Signing(_)
            | AuthError::Repository(_)
            | AuthError::OAuthProvider(_) => {
                error!(error = %err, "internal failure");
                RpcCode::Internal
            }
            AuthError::TokenNotSet
            | AuthError::InvalidAccessToken
            | AuthError::InvalidRefreshToken
            | AuthError::TokenMismatch
            | AuthError::InvalidOAuthPayload => RpcCode::InvalidArgument,
            _ => RpcCode::Unauthenticated,
        };

        Self::new(code, err.message_id())
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let mut response = (self.code.status(), Json(&self)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionStoreError;
    use crate::kvs::KvsError;

    #[test]
    fn test_auth_error_codes() {
        assert_eq!(RpcError::from(AuthError::SessionNotFound).code, RpcCode::Unauthenticated);
        assert_eq!(RpcError::from(AuthError::PasswordNotMatch).code, RpcCode::Unauthenticated);
        assert_eq!(RpcError::from(AuthError::TokenMismatch).code, RpcCode::InvalidArgument);
        assert_eq!(RpcError::from(AuthError::TokenNotSet).code, RpcCode::InvalidArgument);
        assert_eq!(RpcError::from(AuthError::OAuthRejected).code, RpcCode::Unauthenticated);
        assert_eq!(
            RpcError::from(AuthError::OAuthProvider("timeout".into())).code,
            RpcCode::Internal
        );

        let kvs = AuthError::from(SessionStoreError::Kvs(KvsError::Backend("down".into())));
        let err = RpcError::from(kvs);
        assert_eq!(err.code, RpcCode::Internal);
        assert_eq!(err.reason, "internal");
    }

    #[test]
    fn test_unauthenticated_keeps_reason() {
        let err = RpcError::unauthenticated(&AuthError::TokenMismatch);
        assert_eq!(err.code, RpcCode::Unauthenticated);
        assert_eq!(err.reason, "token_mismatch");
    }

    #[test]
    fn test_localized_message() {
        let err = RpcError::from(AuthError::NoAccessToken);
        assert_eq!(err.message, "No access token found.");

        let ja = err.localized(&Catalog, Language::Japanese);
        assert_eq!(ja.message, "アクセストークンが見つかりません。");
        assert_eq!(ja.reason, err.reason);
    }

    #[test]
    fn test_into_response_status_and_extension() {
        let response = RpcError::from(AuthError::SessionNotFound).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let carried = response.extensions().get::<RpcError>().unwrap();
        assert_eq!(carried.reason, "session_not_found");
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(RpcError::invalid_argument(INVALID_REQUEST)).unwrap();
        assert_eq!(json["code"], "invalid_argument");
        assert_eq!(json["reason"], "invalid_request");
        assert_eq!(json["message"], "Request body is invalid.");
    }
}

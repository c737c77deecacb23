//! Session lifecycle use-cases.
//!
//! Each use-case is a small struct built from explicit collaborators:
//! the token codec, the session store and, where needed, the user repository.
//! `UseCases` wires them once at startup and is shared through the router state.

mod authenticate;
mod create_session;
mod logout;
mod oauth_sign_in;
mod refresh_token;

#[cfg(test)]
pub(crate) mod testing;

pub use authenticate::{Authenticate, AuthenticateUser};
pub use create_session::CreateSession;
pub use logout::Logout;
pub use oauth_sign_in::{
    ExchangeFuture, OAuthExchange, OAuthExchangeError, OAuthPayload, OAuthSignIn,
};
pub use refresh_token::RefreshToken;

use std::sync::Arc;

use tracing::info;

use crate::auth::{AuthError, Session, SessionStore, TokenCodec, UserRepository};
use crate::types::UserId;

/// Mint a new pair for `user_id` and register it.
async fn issue_session(
    codec: &TokenCodec,
    sessions: &SessionStore,
    user_id: UserId,
) -> Result<Session, AuthError> {
    let tokens = codec.issue(&user_id).map_err(AuthError::Signing)?;
    let session = Session { user_id, tokens };

    sessions.create(&session).await?;

    info!(user_id = %session.user_id, "session issued");
    Ok(session)
}

/// All session use-cases, sharing one set of collaborators.
#[derive(Clone)]
pub struct UseCases {
    pub authenticate: Authenticate,
    pub authenticate_user: AuthenticateUser,
    pub create_session: CreateSession,
    pub oauth_sign_in: OAuthSignIn,
    pub refresh_token: RefreshToken,
    pub logout: Logout,
}

impl UseCases {
    pub fn new(
        codec: Arc<TokenCodec>,
        sessions: SessionStore,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        let authenticate = Authenticate::new(codec.clone(), sessions.clone());

        Self {
            authenticate_user: AuthenticateUser::new(authenticate.clone(), users.clone()),
            authenticate,
            create_session: CreateSession::new(users.clone(), codec.clone(), sessions.clone()),
            oauth_sign_in: OAuthSignIn::new(users, codec.clone(), sessions.clone()),
            refresh_token: RefreshToken::new(codec.clone(), sessions.clone()),
            logout: Logout::new(codec, sessions),
        }
    }
}

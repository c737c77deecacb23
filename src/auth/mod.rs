//! Token authentication and session registry.
//!
//! This module holds the building blocks of the session subsystem:
//!
//! - **token**: HS256 JWT issuance and verification (`TokenCodec`)
//! - **session**: KVS-backed registry of issued tokens (`SessionStore`)
//! - **extractor**: access/refresh token lookup in request headers
//! - **user_store**: user and credential lookups (`UserRepository`)
//!
//! ## Security Model
//!
//! - A token is usable only while its signature verifies *and* its key is
//!   registered in the session store
//! - Access and refresh tokens are registered under different keys, so a
//!   refresh token can never pass the access-token check
//! - Revocation is key deletion; there is no deny list

mod context;
mod error;
mod extractor;
pub mod password;
mod session;
mod token;
mod user_store;

pub use context::Principal;
pub use error::AuthError;
pub use extractor::{
    ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, cookie_value, extract_access_token,
    extract_refresh_token,
};
pub use session::{Session, SessionStore, SessionStoreError, access_token_key, refresh_token_key};
pub use token::{
    ACCESS_TOKEN_LIFETIME_SECS, Claims, REFRESH_TOKEN_LIFETIME_SECS, Token, TokenCodec, TokenError,
    TokenPair, is_refresh_token_claims,
};
pub use user_store::{RepoFuture, RepositoryError, User, UserRepository, UserStore};

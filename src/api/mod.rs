// RPC endpoints for the auth and user services

use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware,
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::auth::{AuthError, Principal, Session, Token, extract_refresh_token};
use crate::i18n::{Language, Localize};
use crate::rpc::cookie::{clear_cookies, set_cookies};
use crate::rpc::interceptors::{
    LocalizeState, authenticate, localize_errors, log_response, recover_panic, resolve_language,
};
use crate::rpc::{
    GET_ME, INVALID_REQUEST, OAUTH_CALLBACK, REFRESH_TOKEN, RpcError, SIGN_IN, SIGN_OUT,
};
use crate::types::{AuthProvider, Email};
use crate::usecases::{OAuthExchange, UseCases};


#[derive(Clone)]
pub struct AppState {
    pub usecases: UseCases,
    pub localizer: Arc<dyn Localize>,
    pub default_language: Language,
    /// Provider code exchange; without one every OAuth callback is rejected.
    pub oauth: Option<Arc<dyn OAuthExchange>>,
}

impl AppState {
    pub fn with_oauth(mut self, exchange: Arc<dyn OAuthExchange>) -> Self {
        self.oauth = Some(exchange);
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    let rpc = Router::new()
        .route(SIGN_IN, post(sign_in))
        .route(OAUTH_CALLBACK, post(oauth_callback))
        .route(REFRESH_TOKEN, post(refresh_token))
        .route(SIGN_OUT, post(sign_out))
        .route(GET_ME, post(get_me))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .merge(with_interceptors(rpc, &state))
        .layer(CorsLayer::permissive())
}

/// Wrap `router` in the RPC interceptor chain, outermost first.
pub(crate) fn with_interceptors(router: Router, state: &AppState) -> Router {
    let localize = LocalizeState {
        localizer: state.localizer.clone(),
        default_language: state.default_language,
    };

    router.layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(recover_panic))
            .layer(middleware::from_fn_with_state(localize, localize_errors))
            .layer(TraceLayer::new_for_http().on_response(log_response))
            .layer(middleware::from_fn_with_state(
                state.default_language,
                resolve_language,
            ))
            .layer(middleware::from_fn_with_state(
                state.usecases.authenticate_user.clone(),
                authenticate,
            )),
    )
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

#[derive(Debug, Deserialize)]
struct SignInRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct OAuthCallbackRequest {
    provider: String,
    code: String,
}

#[derive(Debug, Default, Deserialize)]
struct RefreshTokenRequest {
    #[serde(default)]
    refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct SignOutRequest {
    #[serde(default)]
    refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: Token,
    pub refresh_token: Token,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Decode a JSON request body; an empty body decodes as `T::default()`.
fn decode<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, RpcError> {
    if body.is_empty() {
        return Ok(T::default());
    }
    decode_required(body)
}

fn decode_required<T: DeserializeOwned>(body: &Bytes) -> Result<T, RpcError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "undecodable request body");
        RpcError::invalid_argument(INVALID_REQUEST)
    })
}

/// Token pair as JSON plus the matching `Set-Cookie` headers.
fn session_response(session: Session) -> Result<Response, RpcError> {
    let [access_cookie, refresh_cookie] = set_cookies(&session.tokens).map_err(|e| {
        error!(user_id = %session.user_id, error = %e, "token not representable as a cookie");
        RpcError::internal()
    })?;

    let body = TokenResponse {
        access_token: session.tokens.access,
        refresh_token: session.tokens.refresh,
    };

    Ok((
        AppendHeaders([(SET_COOKIE, access_cookie), (SET_COOKIE, refresh_cookie)]),
        Json(body),
    )
        .into_response())
}

async fn sign_in(State(state): State<AppState>, body: Bytes) -> Result<Response, RpcError> {
    let request: SignInRequest = decode_required(&body)?;

    let session = state
        .usecases
        .create_session
        .execute(&Email::new(request.email), &request.password)
        .await?;

    session_response(session)
}

/// The identity is taken from the provider exchange, never from the body.
async fn oauth_callback(State(state): State<AppState>, body: Bytes) -> Result<Response, RpcError> {
    let request: OAuthCallbackRequest = decode_required(&body)?;
    let provider = AuthProvider::new(request.provider);

    let Some(exchange) = state.oauth.as_deref() else {
        debug!(provider = %provider, "oauth callback without a configured exchange");
        return Err(AuthError::OAuthRejected.into());
    };

    let session = state
        .usecases
        .oauth_sign_in
        .callback(exchange, &provider, &request.code)
        .await?;

    session_response(session)
}

async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RpcError> {
    let request: RefreshTokenRequest = decode(&body)?;

    let token = if request.refresh_token.is_empty() {
        extract_refresh_token(&headers).unwrap_or_default()
    } else {
        request.refresh_token
    };

    let session = state.usecases.refresh_token.execute(&token).await?;
    session_response(session)
}

async fn sign_out(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RpcError> {
    let request: SignOutRequest = decode(&body)?;

    let refresh = if request.refresh_token.is_empty() {
        extract_refresh_token(&headers).unwrap_or_default()
    } else {
        request.refresh_token
    };

    state
        .usecases
        .logout
        .execute(principal.access_token(), &refresh)
        .await?;

    let [access_cookie, refresh_cookie] = clear_cookies();
    Ok((
        AppendHeaders([(SET_COOKIE, access_cookie), (SET_COOKIE, refresh_cookie)]),
        Json(serde_json::json!({})),
    )
        .into_response())
}

async fn get_me(Extension(principal): Extension<Principal>) -> Json<UserResponse> {
    let user = principal.user();

    Json(UserResponse {
        id: user.id.to_string(),
        email: user.email.as_ref().map(|e| e.to_string()),
        display_name: user.display_name.clone(),
    })
}

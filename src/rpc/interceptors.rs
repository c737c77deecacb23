//! Interceptors wrapped around every RPC procedure.
//!
//! Outermost first: panic recovery, error localization, request logging,
//! language resolution, then the authentication gate. The router assembles
//! them in `api::create_router`.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::header::{ACCEPT_LANGUAGE, CONTENT_LENGTH};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{Span, debug, error, info, warn};

use super::{RpcError, SKIP_AUTHENTICATION};
use crate::auth::{AuthError, Principal, extract_access_token};
use crate::i18n::{Language, Localize, resolve_accept_language};
use crate::usecases::AuthenticateUser;

/// Panic handler for `CatchPanicLayer::custom`.
pub fn recover_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "non-string panic payload"
    };

    error!(panic = %detail, "handler panicked");
    RpcError::internal().into_response()
}

#[derive(Clone)]
pub struct LocalizeState {
    pub localizer: Arc<dyn Localize>,
    pub default_language: Language,
}

/// Re-render the `message` of any error response in the request's language.
pub async fn localize_errors(
    State(state): State<LocalizeState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    let Some(err) = response.extensions().get::<RpcError>() else {
        return response;
    };
    let language = response
        .extensions()
        .get::<Language>()
        .copied()
        .unwrap_or(state.default_language);
    let localized = err.localized(state.localizer.as_ref(), language);

    let (mut parts, _) = response.into_parts();
    let body = Json(&localized).into_response().into_body();
    parts.headers.remove(CONTENT_LENGTH);
    parts.extensions.insert(localized);

    Response::from_parts(parts, body)
}

/// `on_response` hook for the request `TraceLayer`.
pub fn log_response(response: &Response, latency: Duration, _span: &Span) {
    let latency_ms = latency.as_millis() as u64;

    match response.extensions().get::<RpcError>() {
        Some(err) => warn!(
            status = %response.status(),
            latency_ms,
            code = err.code.as_str(),
            reason = %err.reason,
            "rpc failed"
        ),
        None => info!(status = %response.status(), latency_ms, "rpc finished"),
    }
}

/// Negotiate the response language and record it on both request and response.
pub async fn resolve_language(
    State(default_language): State<Language>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    let language = resolve_accept_language(header, default_language);

    request.extensions_mut().insert(language);
    let mut response = next.run(request).await;
    response.extensions_mut().insert(language);
    response
}

/// The authentication gate.
///
/// Procedures in `SKIP_AUTHENTICATION` pass straight through. Everything else
/// needs a registered access token; on success the caller's `Principal` is
/// attached to the request. The gate only reads from the session store.
pub async fn authenticate(
    State(gate): State<AuthenticateUser>,
    mut request: Request,
    next: Next,
) -> Response {
    if SKIP_AUTHENTICATION.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let Some(access_token) = extract_access_token(request.headers()) else {
        debug!(path = %request.uri().path(), "no access token");
        return RpcError::unauthenticated(&AuthError::NoAccessToken).into_response();
    };

    match gate.execute(&access_token).await {
        Ok(user) => {
            let principal = Principal::new(user, access_token);
            debug!(
                user_id = %principal.user_id(),
                user = %principal.display(),
                "request authenticated"
            );
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) if err.is_internal() => RpcError::from(err).into_response(),
        Err(err) => {
            debug!(reason = err.message_id(), "request rejected");
            RpcError::unauthenticated(&err).into_response()
        }
    }
}

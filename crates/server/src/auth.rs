//! Authentication Middleware
//!
//! Bearer API key check on every route except the configured public paths.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::atomic::{AtomicBool, Ordering};

use roy_config::AuthConfig;

use crate::state::AppState;
use crate::ServerError;

static AUTH_DISABLED_WARNED: AtomicBool = AtomicBool::new(false);

enum AuthCheck {
    Pass,
    ConfigError(&'static str),
    CheckKey(String),
}

fn check_auth_config(auth: &AuthConfig, path: &str) -> AuthCheck {
    if !auth.enabled {
        if !AUTH_DISABLED_WARNED.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                "API authentication is disabled. Set ROY__SERVER__AUTH__ENABLED=true for production."
            );
        }
        return AuthCheck::Pass;
    }

    if auth.public_paths.iter().any(|p| path.starts_with(p.as_str())) {
        return AuthCheck::Pass;
    }

    match &auth.api_key {
        Some(key) if !key.is_empty() => AuthCheck::CheckKey(key.clone()),
        _ => AuthCheck::ConfigError("Auth is enabled but no API key is configured"),
    }
}

/// Require `Authorization: Bearer <api_key>` when auth is enabled
pub async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    crate::metrics::record_request();

    let path = request.uri().path().to_string();
    let expected = match check_auth_config(&state.settings.server.auth, &path) {
        AuthCheck::Pass => return next.run(request).await,
        AuthCheck::ConfigError(msg) => {
            return ServerError::Internal(msg.to_string()).into_response();
        },
        AuthCheck::CheckKey(key) => key,
    };

    let key_matches = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|key| constant_time_compare(key.as_bytes(), expected.as_bytes()));

    match key_matches {
        Some(true) => next.run(request).await,
        Some(false) => {
            tracing::warn!(path = %path, "Invalid API key");
            ServerError::Unauthorized("invalid API key".to_string()).into_response()
        },
        None => ServerError::Unauthorized("missing bearer token".to_string()).into_response(),
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

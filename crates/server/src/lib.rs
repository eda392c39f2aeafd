//! Roy Lead Agent Server
//!
//! HTTP API over chat sessions, the listing catalog and the lead store.

pub mod auth;
pub mod http;
pub mod metrics;
pub mod registry;
pub mod state;

pub use auth::auth_middleware;
pub use http::create_router;
pub use crate::metrics::init_metrics;
pub use registry::SessionRegistry;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use roy_agent::AgentError;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Session is busy")]
    Busy,

    #[error("Message limit of {max} reached")]
    LimitReached { max: usize },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Lead store, reply generator or call provider failed
    #[error("Upstream service error: {0}")]
    Collaborator(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) | ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Busy => StatusCode::CONFLICT,
            ServerError::LimitReached { .. } => StatusCode::TOO_MANY_REQUESTS,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Collaborator(_) => StatusCode::BAD_GATEWAY,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the `error` field
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::NotFound(_) => "not_found",
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Validation(_) => "validation_failed",
            ServerError::Busy => "busy",
            ServerError::LimitReached { .. } => "limit_reached",
            ServerError::Unauthorized(_) => "unauthorized",
            ServerError::Collaborator(_) => "upstream_error",
            ServerError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = Json(serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<roy_core::Error> for ServerError {
    fn from(err: roy_core::Error) -> Self {
        match err {
            roy_core::Error::Validation(msg) => ServerError::Validation(msg),
            roy_core::Error::InvalidInput(msg) => ServerError::InvalidRequest(msg),
            roy_core::Error::NotFound(what) => ServerError::NotFound(what),
            e @ (roy_core::Error::Store(_) | roy_core::Error::Reply(_) | roy_core::Error::Call(_)) => {
                ServerError::Collaborator(e.to_string())
            },
            roy_core::Error::Serialization(msg) => ServerError::Internal(msg),
        }
    }
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::InvalidInput(msg) => ServerError::InvalidRequest(msg),
            AgentError::Validation(msg) => ServerError::Validation(msg),
            e @ (AgentError::AlreadyOpen | AgentError::NotActive(_)) => {
                ServerError::InvalidRequest(e.to_string())
            },
            AgentError::LimitReached { max } => ServerError::LimitReached { max },
            AgentError::Initialization(msg) => ServerError::Internal(msg),
            AgentError::Core(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roy_agent::SessionState;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServerError::Busy.status(), StatusCode::CONFLICT);
        assert_eq!(
            ServerError::LimitReached { max: 40 }.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ServerError::from(roy_core::Error::Store("down".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServerError::from(AgentError::NotActive(SessionState::Idle)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(AgentError::Core(roy_core::Error::NotFound("x".into()))).status(),
            StatusCode::NOT_FOUND
        );
    }
}

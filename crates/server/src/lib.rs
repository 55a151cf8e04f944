//! Claritas Server
//!
//! HTTP endpoints for asking questions answered from the source books.

pub mod ask;
pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, record_error, record_fallback, record_latency, record_request};
pub use state::AppState;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A generative backend could not be reached
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// An upstream dependency answered with an error
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Short label used for the error counter
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Unavailable(_) => "unavailable",
            ServerError::Upstream(_) => "upstream",
            ServerError::Internal(_) => "internal",
        }
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<claritas_core::Error> for ServerError {
    fn from(err: claritas_core::Error) -> Self {
        use claritas_core::Error;
        match err {
            Error::Embedding(_) | Error::VectorStore(_) => ServerError::Upstream(err.to_string()),
            Error::Llm(_) | Error::Routing(_) => ServerError::Unavailable(err.to_string()),
            Error::InvalidArgument(_) | Error::Config(_) => ServerError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        record_error(self.kind());
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ServerError::from(claritas_core::Error::Embedding("500".into()));
        assert_eq!(StatusCode::from(&err), StatusCode::BAD_GATEWAY);

        let err = ServerError::from(claritas_core::Error::Llm("refused".into()));
        assert_eq!(StatusCode::from(&err), StatusCode::SERVICE_UNAVAILABLE);

        let err = ServerError::InvalidRequest("blank".into());
        assert_eq!(StatusCode::from(&err), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "invalid_request");
    }
}

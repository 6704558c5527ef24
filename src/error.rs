//! Error types for a3s-chat

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while serving chat requests
#[derive(Debug, Error)]
pub enum ChatError {
    /// Network, auth, or model failure talking to the LLM endpoint
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The upstream answered with a shape the adapter does not understand
    #[error("Adapter protocol error: {0}")]
    AdapterProtocol(String),

    /// Request body failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),

    /// Health probe against the model failed
    #[error("Health check failed: {0}")]
    Unhealthy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Upstream(err.to_string())
    }
}

impl ChatError {
    /// HTTP status used when this error reaches the endpoint boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorBody {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: status.as_u16(),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ChatError::Validation(_) => tracing::debug!(error = %self, "Rejected request"),
            _ => tracing::error!(error = %self, "Request failed"),
        }
        (status, axum::Json(ErrorBody::new(status, self.to_string()))).into_response()
    }
}

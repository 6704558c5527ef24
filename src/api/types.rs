use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ModelCapabilities, ModelConfig};
use crate::error::{ChatError, Result};
use crate::types::ConversationTurn;

/// Maximum accepted message length, in characters
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Body of `POST /chat` and `POST /chat/stream`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    /// Reject messages longer than [`MAX_MESSAGE_CHARS`].
    pub fn validate(&self) -> Result<()> {
        let len = self.message.chars().count();
        if len > MAX_MESSAGE_CHARS {
            return Err(ChatError::Validation(format!(
                "message must be at most {MAX_MESSAGE_CHARS} characters (got {len})"
            )));
        }
        Ok(())
    }
}

/// Model description attached to batch chat responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model: String,
    pub provider: String,
    pub capabilities: ModelCapabilities,
}

impl From<&ModelConfig> for ModelInfo {
    fn from(config: &ModelConfig) -> Self {
        Self {
            model: config.model.clone(),
            provider: config.provider.clone(),
            capabilities: config.capabilities.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub model_info: ModelInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<ConversationTurn>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Generic acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub model_status: String,
    pub conversation_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub docs: String,
    pub frontend: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointDoc {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocsResponse {
    pub endpoints: Vec<EndpointDoc>,
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dirs;
use crate::error::{ChatError, Result};

/// A string wrapper that redacts its value in Debug and Display output.
/// Keeps API keys out of logs and error messages.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the secret value (only for HTTP headers)
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretString(***)")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "***")
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Static capability flags advertised for the configured model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    #[serde(default)]
    pub vision: bool,
    #[serde(default = "default_true")]
    pub function_calling: bool,
    #[serde(default = "default_true")]
    pub json_output: bool,
    #[serde(default = "default_true")]
    pub structured_output: bool,
    #[serde(default = "default_true")]
    pub multiple_system_messages: bool,
    #[serde(default = "default_family")]
    pub family: String,
}

impl Default for ModelCapabilities {
    fn default() -> Self {
        Self {
            vision: false,
            function_calling: true,
            json_output: true,
            structured_output: true,
            multiple_system_messages: true,
            family: default_family(),
        }
    }
}

/// Upstream model endpoint and agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Display name of the model provider
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier sent upstream
    #[serde(default = "default_model")]
    pub model: String,

    /// OpenAI-compatible base URL (a trailing `/v1` is accepted)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: SecretString,

    /// System prompt given to the agent on every call
    #[serde(default = "default_system_message")]
    pub system_message: String,

    /// Number of recent messages kept in the agent's model context
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Connect timeout toward the upstream; the request itself is never timed out
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    #[serde(default)]
    pub capabilities: ModelCapabilities,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            api_key: SecretString::default(),
            system_message: default_system_message(),
            buffer_size: default_buffer_size(),
            connect_timeout_secs: None,
            capabilities: ModelCapabilities::default(),
        }
    }
}

/// User-configurable settings for the chat gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Host address for the HTTP server (default: 127.0.0.1)
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the HTTP server (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served under `/static`
    #[serde(default = "dirs::frontend_dir")]
    pub frontend_dir: PathBuf,

    #[serde(default)]
    pub model: ModelConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_provider() -> String {
    "DeepSeek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_system_message() -> String {
    "You are a helpful AI assistant. Be friendly, accurate, and well organized. \
     Answer in the user's language, keep track of the conversation context, \
     and format replies as Markdown with fenced code blocks for code."
        .to_string()
}

fn default_buffer_size() -> usize {
    10
}

fn default_family() -> String {
    "unknown".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            frontend_dir: dirs::frontend_dir(),
            model: ModelConfig::default(),
        }
    }
}

impl ChatConfig {
    /// Load configuration from the default config file path, then apply
    /// environment overrides. Returns defaults if the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Like [`ChatConfig::load`], reading `path` instead of the default file.
    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(dirs::config_path);
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from an explicit path without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: ChatConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `A3S_CHAT_*` overrides using the given variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("A3S_CHAT_API_KEY").filter(|v| !v.is_empty()) {
            self.model.api_key = SecretString::new(key);
        }
        if let Some(url) = lookup("A3S_CHAT_BASE_URL").filter(|v| !v.is_empty()) {
            self.model.base_url = url;
        }
        if let Some(model) = lookup("A3S_CHAT_MODEL").filter(|v| !v.is_empty()) {
            self.model.model = model;
        }
    }

    /// Write the configuration to the given path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the server bind address string (e.g., "127.0.0.1:8000").
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

//! Core conversation and agent event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role-tagged message in the conversation log. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn stamped with the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Incremental output of an agent run.
///
/// Upstream payloads are decoded into this enum at the adapter boundary;
/// nothing past the adapter inspects raw JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEvent {
    /// Incremental content fragment
    Delta(String),
    /// Fully formed message that supersedes accumulated deltas
    FinalMessage(String),
    /// Batch-style result surfaced mid-stream; carries the last message text
    Aggregate(String),
}

/// Reduces a sequence of [`ResponseEvent`]s to one response text.
///
/// The assembled text is the latest `FinalMessage`/`Aggregate` value if one
/// arrived, otherwise the concatenation of every `Delta` in arrival order.
#[derive(Debug, Default, Clone)]
pub struct ResponseAccumulator {
    full_text: String,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event in. Returns the fragment to forward to the client,
    /// which is only ever the raw delta.
    pub fn apply(&mut self, event: ResponseEvent) -> Option<String> {
        match event {
            ResponseEvent::Delta(text) => {
                self.full_text.push_str(&text);
                Some(text)
            }
            ResponseEvent::FinalMessage(text) | ResponseEvent::Aggregate(text) => {
                if text != self.full_text {
                    self.full_text = text;
                }
                None
            }
        }
    }

    pub fn text(&self) -> &str {
        &self.full_text
    }

    pub fn into_text(self) -> String {
        self.full_text
    }
}

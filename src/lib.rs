//! # a3s-chat
//!
//! HTTP and server-sent-event gateway in front of an LLM chat agent.
//!
//! ## Overview
//!
//! `a3s-chat` accepts chat messages over HTTP, forwards them to an [`Agent`],
//! and returns the reply either as one JSON document or as a stream of SSE
//! frames. Every exchange is recorded in a process-wide [`ConversationStore`].
//!
//! ## Stream protocol
//!
//! `POST /chat/stream` emits, in order:
//!
//! - one `start` frame
//! - zero or more `content` frames, one per incremental delta
//! - exactly one `complete` frame carrying the full reply, or one `error` frame
//! - the literal `data: [DONE]` sentinel
//!
//! The assistant turn is stored only when the stream completes successfully.
//!
//! ## Architecture
//!
//! - **Agent** trait: streaming invocation seam, implemented by [`OpenAiAgent`]
//! - **bridge**: turns agent [`ResponseEvent`]s into [`StreamFrame`]s
//! - **ConversationStore**: ordered, thread-safe turn log
//! - **server** / **api**: axum router and handlers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use a3s_chat::config::ChatConfig;
//!
//! # async fn example() -> a3s_chat::Result<()> {
//! let config = ChatConfig::load()?;
//! a3s_chat::server::start(config).await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod dirs;
pub mod error;
pub mod server;
pub mod store;
pub mod types;

// Re-export core types
pub use agent::{Agent, OpenAiAgent, ResponseStream};
pub use bridge::{bridge, stream_chat, SseMessage, StreamFrame, SSE_DONE};
pub use error::{ChatError, Result};
pub use store::ConversationStore;
pub use types::{ConversationTurn, ResponseAccumulator, ResponseEvent, Role};

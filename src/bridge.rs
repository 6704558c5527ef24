//! Stream bridge: agent events in, SSE protocol frames out
//!
//! The bridge consumes the lazy [`ResponseStream`] of an agent run and turns
//! it into the gateway's framing protocol:
//!
//! ```text
//! start  content*  (complete | error)  [DONE]
//! ```
//!
//! Content frames carry raw deltas only. `FinalMessage` / `Aggregate` events
//! never produce a frame of their own; they only replace the text reported in
//! `complete`. On failure the partial text is dropped and no assistant turn
//! is stored.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::Serialize;

use crate::agent::{Agent, ResponseStream};
use crate::store::ConversationStore;
use crate::types::{ConversationTurn, ResponseAccumulator};

/// Terminator sent after the final frame of every stream
pub const SSE_DONE: &str = "[DONE]";

/// Protocol frame as serialized into an SSE `data` field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    Start { timestamp: DateTime<Utc> },
    Content { content: String },
    Complete { full_response: String },
    Error { error: String },
}

impl StreamFrame {
    pub fn start() -> Self {
        StreamFrame::Start {
            timestamp: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamFrame::Complete { .. } | StreamFrame::Error { .. })
    }
}

/// One message on the outbound SSE channel
#[derive(Debug, Clone, PartialEq)]
pub enum SseMessage {
    Frame(StreamFrame),
    Done,
}

impl SseMessage {
    /// Payload for the SSE `data` field.
    pub fn to_data(&self) -> String {
        match self {
            SseMessage::Frame(frame) => serde_json::to_string(frame).unwrap_or_else(|e| {
                serde_json::json!({ "type": "error", "error": format!("Frame encoding failed: {e}") })
                    .to_string()
            }),
            SseMessage::Done => SSE_DONE.to_string(),
        }
    }

    /// Full wire form, `data: <payload>\n\n`.
    pub fn to_wire(&self) -> String {
        format!("data: {}\n\n", self.to_data())
    }
}

impl From<StreamFrame> for SseMessage {
    fn from(frame: StreamFrame) -> Self {
        SseMessage::Frame(frame)
    }
}

/// Logs streams that were dropped before reaching a terminal frame.
struct DisconnectGuard {
    finished: bool,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if !self.finished {
            tracing::info!("Client disconnected mid-stream; abandoning agent run");
        }
    }
}

/// Frame an agent's event stream, storing the assistant turn on success.
///
/// `Start` is yielded before the first event is requested from `events`.
/// Dropping the returned stream drops `events` with it and stores nothing.
pub fn bridge(
    events: ResponseStream,
    store: Arc<ConversationStore>,
) -> impl Stream<Item = SseMessage> + Send + 'static {
    async_stream::stream! {
        let mut guard = DisconnectGuard { finished: false };
        let mut events = events;
        let mut acc = ResponseAccumulator::new();

        yield SseMessage::Frame(StreamFrame::start());

        let mut failure = None;
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    if let Some(content) = acc.apply(event) {
                        yield SseMessage::Frame(StreamFrame::Content { content });
                    }
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let terminal = match failure {
            Some(e) => {
                tracing::warn!(error = %e, partial_len = acc.text().len(), "Agent stream failed");
                StreamFrame::Error { error: e.to_string() }
            }
            None => {
                let full_response = acc.into_text();
                tracing::info!(len = full_response.len(), "Agent stream completed");
                store.append(ConversationTurn::assistant(full_response.as_str()));
                StreamFrame::Complete { full_response }
            }
        };
        guard.finished = true;
        yield SseMessage::Frame(terminal);
        yield SseMessage::Done;
    }
}

/// Record the user's message, start the agent, and frame its output.
pub fn stream_chat(
    agent: &dyn Agent,
    store: Arc<ConversationStore>,
    message: &str,
) -> impl Stream<Item = SseMessage> + Send + 'static {
    store.append(ConversationTurn::user(message));
    bridge(agent.invoke_streaming(message), store)
}

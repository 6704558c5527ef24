use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures::Stream;
use tracing::Instrument;

use crate::agent::instrument_stream;
use crate::api::sse::sse_response;
use crate::api::types::{ChatRequest, ChatResponse, ModelInfo};
use crate::bridge::stream_chat;
use crate::error::{ChatError, Result};
use crate::server::state::AppState;
use crate::types::ConversationTurn;

/// Unwrap and validate a chat request body.
fn validated(payload: std::result::Result<Json<ChatRequest>, JsonRejection>) -> Result<String> {
    let Json(request) = payload.map_err(|e| ChatError::Validation(e.body_text()))?;
    request.validate()?;
    Ok(request.message)
}

/// POST /chat - Run the agent to completion and return the full reply.
pub async fn handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let message = validated(payload)?;
    let span = tracing::info_span!("chat", request_id = %uuid::Uuid::new_v4(), streaming = false);

    async move {
        tracing::info!(len = message.len(), "Received chat message");
        state.store.append(ConversationTurn::user(message.as_str()));

        let content = state.agent.invoke(&message).await?;
        state
            .store
            .append(ConversationTurn::assistant(content.as_str()));

        Ok(Json(ChatResponse {
            content,
            timestamp: chrono::Utc::now(),
            model_info: ModelInfo::from(&state.config.model),
        }))
    }
    .instrument(span)
    .await
}

/// POST /chat/stream - Stream the agent's reply as server-sent events.
pub async fn stream_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let message = validated(payload)?;
    let span = tracing::info_span!("chat", request_id = %uuid::Uuid::new_v4(), streaming = true);

    let frames = span.in_scope(|| {
        tracing::info!(len = message.len(), "Received streaming chat message");
        stream_chat(state.agent.as_ref(), state.store.clone(), &message)
    });
    Ok(sse_response(instrument_stream(frames, span)))
}

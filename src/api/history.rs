use axum::extract::State;
use axum::Json;

use crate::api::types::{HistoryResponse, MessageResponse};
use crate::server::state::AppState;

/// GET /chat/history - Snapshot of the conversation log.
pub async fn list_handler(State(state): State<AppState>) -> Json<HistoryResponse> {
    let history = state.store.all();
    Json(HistoryResponse {
        count: history.len(),
        history,
        timestamp: chrono::Utc::now(),
    })
}

/// DELETE /chat/history - Clear the conversation log.
pub async fn clear_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.store.clear();
    Json(MessageResponse {
        message: "Conversation history cleared".to_string(),
        timestamp: chrono::Utc::now(),
    })
}

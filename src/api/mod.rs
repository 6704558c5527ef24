pub mod chat;
pub mod health;
pub mod history;
pub mod sse;
pub mod types;

use axum::routing::{get, post};
use axum::Router;

use crate::server::state::AppState;

/// Build the chat API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/docs", get(health::docs_handler))
        .route("/health", get(health::health_handler))
        .route("/chat", post(chat::handler))
        .route("/chat/stream", post(chat::stream_handler))
        .route(
            "/chat/history",
            get(history::list_handler).delete(history::clear_handler),
        )
}

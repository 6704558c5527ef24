pub mod router;
pub mod state;

use std::sync::Arc;

use crate::agent::OpenAiAgent;
use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::store::ConversationStore;

/// Start the HTTP server with the given configuration.
///
/// Runs until Ctrl+C, then stops accepting connections and drains in-flight
/// requests.
pub async fn start(config: ChatConfig) -> Result<()> {
    if config.model.api_key.is_empty() {
        tracing::warn!("No API key configured; upstream calls will likely be rejected");
    }

    let agent = Arc::new(OpenAiAgent::from_config(&config.model)?);
    tracing::info!(
        model = %config.model.model,
        base_url = %config.model.base_url,
        buffer_size = config.model.buffer_size,
        "Initialized agent"
    );

    let bind_addr = config.bind_address();
    let app_state = state::AppState::new(
        agent,
        Arc::new(ConversationStore::new()),
        Arc::new(config),
    );

    let app = router::build(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| ChatError::Server(format!("Failed to bind to {bind_addr}: {e}")))?;

    tracing::info!("Server listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ChatError::Server(format!("Server error: {e}")))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

use axum::extract::State;
use axum::Json;

use crate::api::types::{DocsResponse, EndpointDoc, HealthResponse, RootResponse};
use crate::error::{ChatError, Result};
use crate::server::state::AppState;

/// GET / - Service banner.
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "A3S Chat API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        docs: "/docs".to_string(),
        frontend: "/static/index.html".to_string(),
    })
}

/// GET /docs - Endpoint map.
pub async fn docs_handler() -> Json<DocsResponse> {
    Json(DocsResponse {
        endpoints: vec![
            EndpointDoc {
                method: "GET",
                path: "/",
                description: "Service banner",
            },
            EndpointDoc {
                method: "GET",
                path: "/health",
                description: "Probe the model and report service health",
            },
            EndpointDoc {
                method: "POST",
                path: "/chat",
                description: "Send a message and wait for the full reply",
            },
            EndpointDoc {
                method: "POST",
                path: "/chat/stream",
                description: "Send a message and stream the reply as server-sent events",
            },
            EndpointDoc {
                method: "GET",
                path: "/chat/history",
                description: "List the conversation history",
            },
            EndpointDoc {
                method: "DELETE",
                path: "/chat/history",
                description: "Clear the conversation history",
            },
        ],
    })
}

/// GET /health - Probe the agent with a trivial task.
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    state.agent.probe().await.map_err(|e| {
        tracing::warn!(agent = state.agent.name(), error = %e, "Health probe failed");
        ChatError::Unhealthy(e.to_string())
    })?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_status: "healthy".to_string(),
        conversation_count: state.store.len(),
    }))
}

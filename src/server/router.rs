use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::state::AppState;
use crate::api;
use crate::error::ErrorBody;

/// Build the complete axum Router with all API routes.
pub fn build(state: AppState) -> Router {
    let mut router = api::routes();

    let frontend = state.config.frontend_dir.clone();
    if frontend.is_dir() {
        tracing::info!(dir = %frontend.display(), "Serving frontend under /static");
        router = router.nest_service("/static", ServeDir::new(frontend));
    } else {
        tracing::warn!(dir = %frontend.display(), "Frontend directory not found, /static disabled");
    }

    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Turn a handler panic into the standard 500 error body.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    (
        status,
        Json(ErrorBody::new(status, format!("Internal server error: {detail}"))),
    )
        .into_response()
}

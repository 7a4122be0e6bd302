use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// Schema management
pub fn schema_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/schema", get(handlers::api::get_schema))
        .route("/schema/refresh", post(handlers::api::refresh_schema))
        .route("/schema/import", post(handlers::api::import_schema))
}

// Natural language questions
pub fn chat_routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(handlers::api::chat))
}

pub fn system_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::api::health))
        .route("/status", get(handlers::api::system_status))
}

/// The complete application with middleware applied.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(system_routes())
        .merge(schema_routes())
        .merge(chat_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

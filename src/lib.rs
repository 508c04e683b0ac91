pub mod codegen;
pub mod config;
pub mod handlers;
pub mod models;
pub mod store;

use axum::{
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    /// The only shared mutable resource; all writes go through its
    /// atomic `try_insert`.
    pub store: Arc<dyn store::MappingStore>,
    pub shortener: codegen::Shortener,
    pub config: config::AppConfig,
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/shorten", post(handlers::shorten::shorten))
        // Health check — returns 200 OK with no store interaction
        .route("/health", get(health))
        // Short-link redirect catches everything else at the root
        .route("/:code", get(handlers::redirect::redirect))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

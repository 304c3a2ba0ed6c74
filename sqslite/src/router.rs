//! HTTP router for the sqslite server

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use sqslite_queue::SqsState;

/// Create the main application router
pub fn create_router(state: Arc<SqsState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(sqslite_queue::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<SqsState>>) -> Json<Value> {
    Json(json!({
        "status": "running",
        "queues": state.engine.queue_count(),
    }))
}

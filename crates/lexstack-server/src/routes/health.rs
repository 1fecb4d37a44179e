use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

/// Liveness: the process is up and serving.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "lexstack-server",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.started.elapsed().as_secs(),
    }))
}

/// Readiness. Models load lazily, so the server accepts uploads before they
/// are in memory; `models_loaded` tells whether the first prediction will
/// pay the loading cost.
pub async fn ready(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ready",
        "models_loaded": state.models_loaded(),
        "models_dir": state.config.models_dir.display().to_string(),
    }))
}

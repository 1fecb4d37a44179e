//! API route handlers.
//!
//! - `health`: liveness and readiness probes
//! - `predict`: document upload and classification

pub mod health;
pub mod predict;

use axum::Json;
use serde_json::{Value, json};

use crate::error::ServerError;

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({ "status": "lexstack backend running" }))
}

pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

//! HTTP API for the lexstack document classifier.
//!
//! - `GET /` status message
//! - `POST /predict` multipart upload (field `file`, `.pdf` or `.docx`)
//! - `GET /health` liveness probe
//! - `GET /ready` readiness probe, reports whether the models are loaded
//!
//! Errors come back as `{"error": "<message>"}`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServiceConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, serve, start_server};
pub use state::AppState;

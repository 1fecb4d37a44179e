//! Router assembly and the serve loop.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::middleware::{json_errors, log_requests, request_id};
use crate::routes::{health, not_found, predict, root};
use crate::state::AppState;

/// Build the router with all routes and middleware.
///
/// Layers run outermost first: trace, request id, request logging, CORS,
/// JSON error bodies, timeout, body limit.
pub fn build_router(state: Arc<AppState>) -> Router {
    let config = &state.config;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/predict", post(predict::predict))
        .fallback(not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.timeout(),
        ))
        .layer(from_fn(json_errors))
        .layer(cors_layer(&config.cors_origins))
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin when none are configured; otherwise exactly the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return cors.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

/// Serve until SIGTERM or Ctrl+C.
pub async fn start_server(config: ServiceConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(config));

    if state.config.preload_models {
        let loader = state.clone();
        tokio::task::spawn_blocking(move || loader.ensure_loaded()).await??;
    }

    serve(state, addr).await
}

/// Serve an already-built state on `addr`.
pub async fn serve(state: Arc<AppState>, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    tracing::info!(
        %addr,
        models_dir = %state.config.models_dir.display(),
        max_upload_mb = state.config.max_upload_mb,
        timeout_secs = state.config.timeout_secs,
        cors_origins = ?state.config.cors_origins,
        "starting lexstack server"
    );

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

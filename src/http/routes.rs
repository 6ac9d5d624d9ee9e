//! Router construction and HTTP serving.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::http::handlers::{callbacks, jobs, send};
use crate::http::state::AppState;
use crate::{AppError, Result};

/// Handler for `GET /health` — returns 200 OK with a plain-text body.
async fn health() -> &'static str {
    "ok"
}

/// Build the application router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/jobs", post(jobs::create_job))
        .route(
            "/api/jobs/{job_id}",
            get(jobs::get_job).delete(jobs::delete_job),
        )
        .route("/api/jobs/{job_id}/reset", post(jobs::reset_job))
        .route("/api/jobs/{job_id}/send", post(send::send_batch))
        .route(
            "/api/jobs/{job_id}/callbacks/progress",
            post(callbacks::progress),
        )
        .route("/api/jobs/{job_id}/callbacks/done", post(callbacks::done))
        .route("/api/jobs/{job_id}/callbacks/error", post(callbacks::error))
        .with_state(state)
}

/// Serve the HTTP API on `config.http_port` until cancellation.
///
/// # Errors
///
/// Returns `AppError::Config` if the listener fails to bind or the
/// server errors out.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let bind = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind HTTP on {bind}: {err}")))?;

    info!(%bind, "starting HTTP API");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            ct.cancelled().await;
        })
        .await
        .map_err(|err| AppError::Config(format!("HTTP server error: {err}")))?;

    info!("HTTP API shut down");
    Ok(())
}

//! Batch send handler: one bounded batch per request.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use bytes::Bytes;

use crate::http::state::AppState;
use crate::sender::{BatchOptions, BatchReport};
use crate::{AppError, Result};

use super::require_owner;

/// `POST /api/jobs/{job_id}/send` — dispatch the next batch of pending
/// deliveries.
///
/// The body is optional; when present it carries `batch_size` and
/// `pace_ms` overrides. The client drives completion by calling again
/// while `remaining > 0`.
///
/// # Errors
///
/// Returns `AppError::NotFound` / `AppError::Unauthorized` for unknown or
/// foreign jobs, `AppError::NotReady` before drafts are finalized, and
/// `AppError::Token` when no delivery credential could be obtained (in
/// which case nothing was sent).
pub async fn send_batch(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<BatchReport>> {
    let job = state
        .store
        .get_job(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;
    require_owner(&headers, &job)?;

    let options: BatchOptions = if body.is_empty() {
        BatchOptions::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| AppError::Payload(format!("invalid send options: {err}")))?
    };

    let report = state
        .sender
        .send_batch(&state.store, &job_id, options)
        .await?;
    Ok(Json(report))
}

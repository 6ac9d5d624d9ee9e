//! Authenticated callbacks from the external workflow engine.
//!
//! Every callback is verified against the raw request body before any
//! store mutation. Callbacks naming a job that no longer exists are
//! acknowledged with `202` and ignored, so the engine never retries into
//! a deleted job.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::http::signature::{verify_signature, SIGNATURE_HEADER};
use crate::http::state::AppState;
use crate::models::{
    DraftMessage, JobStatus, Patch, Preview, ProgressUpdate, StatusPatch,
};
use crate::{AppError, Result};

/// Incremental progress report from the rewrite engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProgressCallback {
    /// Units of work completed since the previous report.
    #[serde(default)]
    pub count: Option<i64>,
    /// Revised estimate of total units.
    #[serde(default)]
    pub total: Option<i64>,
    /// Current processing phase label.
    #[serde(default)]
    pub stage: Patch<String>,
    /// Free-text phase detail.
    #[serde(default)]
    pub detail: Patch<String>,
    /// Draft samples produced since the previous report.
    #[serde(default)]
    pub previews: Vec<Preview>,
}

/// Completion report carrying the finalized drafts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DoneCallback {
    /// Finalized drafts, one per recipient.
    pub messages: Vec<DraftMessage>,
    /// Final total, when the engine revises its estimate.
    #[serde(default)]
    pub total: Option<i64>,
    /// Final phase label.
    #[serde(default)]
    pub stage: Patch<String>,
    /// Final phase detail.
    #[serde(default)]
    pub detail: Patch<String>,
}

/// Failure report from the rewrite engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorCallback {
    /// Upstream failure description.
    pub error: String,
    /// Phase the failure occurred in.
    #[serde(default)]
    pub stage: Patch<String>,
    /// Free-text failure detail.
    #[serde(default)]
    pub detail: Patch<String>,
}

fn authenticate(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<()> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    verify_signature(&state.config.callback_secret, body, provided)
}

fn parse<'de, T: Deserialize<'de>>(body: &'de [u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|err| AppError::Payload(format!("invalid callback payload: {err}")))
}

fn ignored(job_id: &str) -> (StatusCode, Json<Value>) {
    warn!(job_id, "callback for unknown job ignored");
    (StatusCode::ACCEPTED, Json(json!({ "status": "ignored" })))
}

fn accepted() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "accepted" })))
}

/// `POST /api/jobs/{job_id}/callbacks/progress`.
///
/// Applies the progress increment, appends previews, and marks the job
/// `running`.
///
/// # Errors
///
/// Returns `AppError::Signature` for a missing or invalid signature and
/// `AppError::Payload` for a malformed body; neither mutates the store.
pub async fn progress(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>)> {
    authenticate(&state, &headers, &body)?;
    let payload: ProgressCallback = parse(&body)?;

    let count = payload.count.unwrap_or(0).max(0);
    let updated = state.store.update_job(&job_id, |job| {
        let done = i64::try_from(job.progress.done)
            .unwrap_or(i64::MAX)
            .saturating_add(count);
        job.apply_progress(ProgressUpdate {
            done: Some(done),
            total: payload.total,
        });
        job.apply_labels(payload.stage.clone(), payload.detail.clone());
    });
    if updated.is_none() {
        return Ok(ignored(&job_id));
    }

    state
        .store
        .append_previews(&job_id, payload.previews, state.config.send.preview_limit);
    state
        .store
        .mark_job_status(&job_id, JobStatus::Running, StatusPatch::default());

    info!(%job_id, count, "progress callback applied");
    Ok(accepted())
}

/// `POST /api/jobs/{job_id}/callbacks/done`.
///
/// Replaces the message list with all-pending delivery records, marks
/// progress complete, and transitions the job to `ready`.
///
/// # Errors
///
/// Returns `AppError::Signature` for a missing or invalid signature and
/// `AppError::Payload` for a malformed body; neither mutates the store.
pub async fn done(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>)> {
    authenticate(&state, &headers, &body)?;
    let payload: DoneCallback = parse(&body)?;

    let message_count = payload.messages.len();
    if state
        .store
        .set_job_messages(&job_id, payload.messages)
        .is_none()
    {
        return Ok(ignored(&job_id));
    }

    // The engine is finished: progress reads complete from here on.
    let total = payload
        .total
        .or_else(|| i64::try_from(message_count).ok());
    state.store.update_progress(
        &job_id,
        ProgressUpdate { done: total, total },
        payload.stage,
        payload.detail,
    );
    state
        .store
        .mark_job_status(&job_id, JobStatus::Ready, StatusPatch::default());

    info!(%job_id, messages = message_count, "done callback applied");
    Ok(accepted())
}

/// `POST /api/jobs/{job_id}/callbacks/error`.
///
/// Marks the job `error` with the upstream message preserved in
/// `last_error`. The state is sticky for the job's lifetime.
///
/// # Errors
///
/// Returns `AppError::Signature` for a missing or invalid signature and
/// `AppError::Payload` for a malformed body; neither mutates the store.
pub async fn error(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>)> {
    authenticate(&state, &headers, &body)?;
    let payload: ErrorCallback = parse(&body)?;

    let patch = StatusPatch {
        stage: payload.stage,
        detail: payload.detail,
        error: Patch::Set(payload.error),
    };
    if state
        .store
        .mark_job_status(&job_id, JobStatus::Error, patch)
        .is_none()
    {
        return Ok(ignored(&job_id));
    }

    warn!(%job_id, "error callback applied");
    Ok(accepted())
}

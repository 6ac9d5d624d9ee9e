//! Client-facing job lifecycle handlers: create, poll, reset, delete.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::http::state::AppState;
use crate::models::{DeliveryRecord, Job, JobStatus, Preview, Progress, SendSummary};
use crate::{AppError, Result};

use super::require_owner;

/// Request body for job creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateJobRequest {
    /// Caller-supplied identifier; generated when absent. Uniqueness is
    /// the caller's responsibility.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Owning principal.
    pub user_id: String,
    /// Initial estimate of total rewrite units.
    #[serde(default)]
    pub total: u64,
}

/// Job snapshot returned to clients.
///
/// `messages` is present only once the job is `ready`, so partial drafts
/// are never exposed mid-rewrite. `percent` is derived at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct JobView {
    /// Job identifier.
    pub job_id: String,
    /// Owning principal.
    pub user_id: String,
    /// Lifecycle status.
    pub status: JobStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Raw progress counters; `done` may exceed `total`.
    pub progress: Progress,
    /// Display percent, clamped to `[0, 100]`.
    pub percent: u8,
    /// Current processing phase label.
    pub stage: Option<String>,
    /// Free-text phase detail.
    pub detail: Option<String>,
    /// Most-recent draft samples.
    pub previews: Vec<Preview>,
    /// Last error description, if any.
    pub last_error: Option<String>,
    /// Cumulative send counters.
    pub send_summary: SendSummary,
    /// Delivery records, withheld until the job is `ready`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<DeliveryRecord>>,
}

impl JobView {
    /// Project a stored job into its client-facing shape.
    #[must_use]
    pub fn from_job(job: &Job) -> Self {
        let messages = (job.status == JobStatus::Ready).then(|| job.messages.clone());
        Self {
            job_id: job.id.clone(),
            user_id: job.user_id.clone(),
            status: job.status,
            created_at: job.created_at,
            updated_at: job.updated_at,
            progress: job.progress,
            percent: job.percent(),
            stage: job.stage.clone(),
            detail: job.detail.clone(),
            previews: job.previews.clone(),
            last_error: job.last_error.clone(),
            send_summary: job.send_summary,
            messages,
        }
    }
}

/// `POST /api/jobs` — register a new rewrite/send job.
///
/// # Errors
///
/// Returns `AppError::AlreadyExists` when the supplied `job_id` is
/// already registered.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobView>)> {
    let job_id = request
        .job_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let job = state.store.create_job(&job_id, &request.user_id, request.total)?;
    info!(%job_id, user_id = %request.user_id, total = request.total, "job created");
    Ok((StatusCode::CREATED, Json(JobView::from_job(&job))))
}

/// `GET /api/jobs/{job_id}` — poll a job snapshot.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown job and
/// `AppError::Unauthorized` for a foreign principal.
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<JobView>> {
    let job = state
        .store
        .get_job(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;
    require_owner(&headers, &job)?;
    Ok(Json(JobView::from_job(&job)))
}

/// `POST /api/jobs/{job_id}/reset` — revert all deliveries to pending.
///
/// Status is unchanged; only the send phase restarts.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown job and
/// `AppError::Unauthorized` for a foreign principal.
pub async fn reset_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<JobView>> {
    let job = state
        .store
        .get_job(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;
    require_owner(&headers, &job)?;

    let job = state
        .store
        .reset_send_progress(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;
    info!(%job_id, "send progress reset");
    Ok(Json(JobView::from_job(&job)))
}

/// `DELETE /api/jobs/{job_id}` — remove a job from the registry.
///
/// Callbacks arriving after deletion are acknowledged and ignored.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown job and
/// `AppError::Unauthorized` for a foreign principal.
pub async fn delete_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let job = state
        .store
        .get_job(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;
    require_owner(&headers, &job)?;

    state.store.delete_job(&job_id);
    info!(%job_id, "job deleted");
    Ok(StatusCode::NO_CONTENT)
}

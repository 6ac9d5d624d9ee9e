//! Boundary authorization: only the owning principal may act on a job.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use bytes::Bytes;
use outreach_relay::http::handlers::jobs::CreateJobRequest;
use outreach_relay::http::handlers::{jobs, send};
use outreach_relay::AppError;

use super::test_helpers::{test_state, user_headers};

async fn state_with_job() -> Arc<outreach_relay::http::AppState> {
    let state = test_state();
    jobs::create_job(
        State(Arc::clone(&state)),
        Json(CreateJobRequest {
            job_id: Some("job-1".into()),
            user_id: "user-1".into(),
            total: 2,
        }),
    )
    .await
    .expect("create succeeds");
    state
}

#[tokio::test]
async fn owner_can_read_the_job() {
    let state = state_with_job().await;

    let result = jobs::get_job(
        State(Arc::clone(&state)),
        Path("job-1".to_owned()),
        user_headers("user-1"),
    )
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn foreign_user_cannot_read_the_job() {
    let state = state_with_job().await;

    let result = jobs::get_job(
        State(Arc::clone(&state)),
        Path("job-1".to_owned()),
        user_headers("intruder"),
    )
    .await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn missing_user_header_is_rejected() {
    let state = state_with_job().await;

    let result = jobs::get_job(
        State(Arc::clone(&state)),
        Path("job-1".to_owned()),
        HeaderMap::new(),
    )
    .await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn unknown_job_is_not_found_before_authorization() {
    let state = test_state();

    let result = jobs::get_job(
        State(Arc::clone(&state)),
        Path("ghost".to_owned()),
        user_headers("user-1"),
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn foreign_user_cannot_send() {
    let state = state_with_job().await;

    let result = send::send_batch(
        State(Arc::clone(&state)),
        Path("job-1".to_owned()),
        user_headers("intruder"),
        Bytes::new(),
    )
    .await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn foreign_user_cannot_delete() {
    let state = state_with_job().await;

    let result = jobs::delete_job(
        State(Arc::clone(&state)),
        Path("job-1".to_owned()),
        user_headers("intruder"),
    )
    .await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    assert!(state.store.get_job("job-1").is_some());
}

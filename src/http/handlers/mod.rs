//! Route handlers for the job API and engine callbacks.

pub mod callbacks;
pub mod jobs;
pub mod send;

use axum::http::HeaderMap;

use crate::models::Job;
use crate::{AppError, Result};

/// Header carrying the acting principal for client-facing routes.
pub const USER_HEADER: &str = "x-user-id";

/// Check that the caller owns the job.
///
/// Ownership is enforced here at the boundary; the store itself never
/// filters by principal.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` when the header is absent or names a
/// different principal.
pub fn require_owner(headers: &HeaderMap, job: &Job) -> Result<()> {
    let user = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {USER_HEADER} header")))?;
    if user == job.user_id {
        Ok(())
    } else {
        Err(AppError::Unauthorized(
            "job belongs to a different user".into(),
        ))
    }
}

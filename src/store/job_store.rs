//! Keyed registry of [`Job`] records with copy-on-read snapshots.
//!
//! The store exclusively owns every job; callers only ever see clones, so
//! external mutation of a snapshot never leaks back into stored state.
//! Every write runs read-copy-mutate-commit inside a single lock
//! acquisition with no await points, which is what keeps concurrent
//! webhook callbacks, polling reads, and batch-send reconciliation from
//! losing updates.
//!
//! Mutators on an unknown job are deliberate no-ops returning `None`
//! rather than errors, so callbacks arriving after a job was deleted are
//! harmless.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::models::{
    DraftMessage, Job, JobStatus, Patch, Preview, ProgressUpdate, SendOutcome, StatusPatch,
};
use crate::{AppError, Result};

/// In-memory registry keyed by job id.
///
/// Constructed once at process start by the composition root and shared
/// via `Arc`; lives until process exit, with no persistence.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: Mutex<HashMap<String, Job>>,
}

impl JobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new queued job.
    ///
    /// Identifier uniqueness is the caller's responsibility; reuse is a
    /// conflict, never an overwrite.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AlreadyExists` if `job_id` is already registered.
    pub fn create_job(&self, job_id: &str, user_id: &str, total: u64) -> Result<Job> {
        let mut jobs = self.lock();
        if jobs.contains_key(job_id) {
            return Err(AppError::AlreadyExists(format!(
                "job {job_id} already exists"
            )));
        }
        let job = Job::new(job_id.to_owned(), user_id.to_owned(), total);
        jobs.insert(job_id.to_owned(), job.clone());
        Ok(job)
    }

    /// Return an independent snapshot of a job, if it exists.
    #[must_use]
    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.lock().get(job_id).cloned()
    }

    /// Remove a job. Returns `false` when it was not present.
    pub fn delete_job(&self, job_id: &str) -> bool {
        self.lock().remove(job_id).is_some()
    }

    /// Number of registered jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no jobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The atomic read-modify-write primitive.
    ///
    /// Runs `mutate` against the stored job under the lock, stamps
    /// `updated_at`, and returns a snapshot of the committed state. Every
    /// other mutator is expressed through this chokepoint. The mutator
    /// must not block; delivery and token I/O happen outside the lock.
    pub fn update_job(&self, job_id: &str, mutate: impl FnOnce(&mut Job)) -> Option<Job> {
        let mut jobs = self.lock();
        let job = jobs.get_mut(job_id)?;
        mutate(job);
        job.updated_at = chrono::Utc::now();
        Some(job.clone())
    }

    /// Normalize and append previews, evicting the oldest beyond `limit`.
    pub fn append_previews(
        &self,
        job_id: &str,
        previews: Vec<Preview>,
        limit: usize,
    ) -> Option<Job> {
        self.update_job(job_id, |job| job.push_previews(previews, limit))
    }

    /// Replace the message list with all-pending records and zero the
    /// send summary. This is the transition point from drafting to
    /// sendable.
    pub fn set_job_messages(&self, job_id: &str, drafts: Vec<DraftMessage>) -> Option<Job> {
        self.update_job(job_id, |job| job.replace_messages(drafts))
    }

    /// Set the job status and merge the accompanying labels.
    pub fn mark_job_status(
        &self,
        job_id: &str,
        status: JobStatus,
        patch: StatusPatch,
    ) -> Option<Job> {
        self.update_job(job_id, |job| job.apply_status(status, patch))
    }

    /// Apply a partial progress update plus optional label merges.
    pub fn update_progress(
        &self,
        job_id: &str,
        update: ProgressUpdate,
        stage: Patch<String>,
        detail: Patch<String>,
    ) -> Option<Job> {
        self.update_job(job_id, |job| {
            job.apply_progress(update);
            job.apply_labels(stage, detail);
        })
    }

    /// Record one delivery outcome against `messages[index]`.
    ///
    /// An out-of-range index is a no-op on the record and the counters.
    /// Counters increment rather than recompute, so replaying the same
    /// index double-counts.
    pub fn record_send_outcome(
        &self,
        job_id: &str,
        index: usize,
        outcome: SendOutcome,
    ) -> Option<Job> {
        self.update_job(job_id, |job| {
            job.record_outcome(index, outcome);
        })
    }

    /// Revert every delivery record to pending with a zeroed summary, so
    /// the send phase can be retried from scratch. Status is unchanged.
    pub fn reset_send_progress(&self, job_id: &str) -> Option<Job> {
        self.update_job(job_id, Job::reset_deliveries)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

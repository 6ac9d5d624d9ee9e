//! Job aggregate: one tracked rewrite/send workflow instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::delivery::{DeliveryRecord, DeliveryStatus, DraftMessage, Preview, SendOutcome};
use super::patch::Patch;

/// Lifecycle status for a rewrite/send job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, no worker callback received yet.
    Queued,
    /// The external worker is producing drafts.
    Running,
    /// Drafts are finalized; batch sends are permitted.
    Ready,
    /// The workflow failed; sticky for the job's lifetime.
    Error,
}

impl JobStatus {
    /// Determine whether a lifecycle transition is permitted.
    ///
    /// `ready` and `error` are terminal with respect to the drafting
    /// phase; `error` remains reachable from `ready` so a send-phase
    /// collaborator failure can be recorded against the job.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running | Self::Ready)
                | (Self::Running, Self::Ready)
                | (Self::Queued | Self::Running | Self::Ready, Self::Error)
        )
    }
}

/// Rewrite progress counters.
///
/// `done` and `total` are independently settable; nothing forces
/// `done <= total`. Displayed percentages clamp, stored counters do not.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Progress {
    /// Units of work completed so far.
    pub done: u64,
    /// Current best estimate of total units.
    pub total: u64,
}

/// Running delivery counters for the send phase.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SendSummary {
    /// Deliveries recorded as sent.
    pub sent: u64,
    /// Deliveries recorded as failed.
    pub failed: u64,
}

/// Partial progress update; each counter is applied only when present,
/// with negative values clamped to zero.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ProgressUpdate {
    /// New absolute `done` value, if provided.
    #[serde(default)]
    pub done: Option<i64>,
    /// New absolute `total` value, if provided.
    #[serde(default)]
    pub total: Option<i64>,
}

/// Optional label/error merge accompanying a status change.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct StatusPatch {
    /// Current processing phase label.
    #[serde(default)]
    pub stage: Patch<String>,
    /// Free-text detail for the current phase.
    #[serde(default)]
    pub detail: Patch<String>,
    /// Error description; always copied into `last_error` when set.
    #[serde(default)]
    pub error: Patch<String>,
}

/// One tracked rewrite/send workflow instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Job {
    /// Opaque unique identifier, immutable.
    pub id: String,
    /// Owning principal, immutable; checked at the HTTP boundary.
    pub user_id: String,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
    /// Rewrite progress counters.
    pub progress: Progress,
    /// Current processing phase label.
    pub stage: Option<String>,
    /// Free-text detail for the current phase.
    pub detail: Option<String>,
    /// Most-recent draft samples, FIFO-evicted at the preview cap.
    pub previews: Vec<Preview>,
    /// Delivery records, set wholesale when drafts are finalized.
    pub messages: Vec<DeliveryRecord>,
    /// Last error description; sticky once set.
    pub last_error: Option<String>,
    /// Running send counters, reset whenever `messages` is replaced.
    pub send_summary: SendSummary,
}

impl Job {
    /// Construct a queued job with the given identity and total estimate.
    #[must_use]
    pub fn new(id: String, user_id: String, total: u64) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
            progress: Progress { done: 0, total },
            stage: None,
            detail: None,
            previews: Vec::new(),
            messages: Vec::new(),
            last_error: None,
            send_summary: SendSummary::default(),
        }
    }

    /// Percent complete derived from the progress counters.
    ///
    /// Re-derived at read time, never stored: `total == 0` yields 0, and
    /// the result clamps to 100 when `done` exceeds `total`.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.progress.total == 0 {
            return 0;
        }
        let scaled = self
            .progress
            .done
            .saturating_mul(100)
            .saturating_add(self.progress.total / 2)
            / self.progress.total;
        u8::try_from(scaled.min(100)).unwrap_or(100)
    }

    /// Apply a partial progress update, clamping negatives to zero.
    pub fn apply_progress(&mut self, update: ProgressUpdate) {
        if let Some(done) = update.done {
            self.progress.done = u64::try_from(done.max(0)).unwrap_or(0);
        }
        if let Some(total) = update.total {
            self.progress.total = u64::try_from(total.max(0)).unwrap_or(0);
        }
    }

    /// Apply a status change with merged labels.
    ///
    /// Invalid lifecycle transitions leave `status` untouched; the label
    /// and error merges still apply. A set `error` always lands in
    /// `last_error`, which is otherwise sticky.
    pub fn apply_status(&mut self, status: JobStatus, patch: StatusPatch) {
        if self.status == status || self.status.can_transition_to(status) {
            self.status = status;
        }
        patch.stage.apply_to(&mut self.stage);
        patch.detail.apply_to(&mut self.detail);
        patch.error.apply_to(&mut self.last_error);
    }

    /// Merge optional stage/detail labels, last-writer-wins.
    pub fn apply_labels(&mut self, stage: Patch<String>, detail: Patch<String>) {
        stage.apply_to(&mut self.stage);
        detail.apply_to(&mut self.detail);
    }

    /// Normalize and append previews, then FIFO-evict down to `limit`.
    pub fn push_previews(&mut self, candidates: Vec<Preview>, limit: usize) {
        self.previews
            .extend(candidates.into_iter().filter_map(Preview::normalize));
        if self.previews.len() > limit {
            let excess = self.previews.len() - limit;
            self.previews.drain(..excess);
        }
    }

    /// Replace the message list with all-pending records derived from the
    /// given drafts, zeroing the send summary.
    pub fn replace_messages(&mut self, drafts: Vec<DraftMessage>) {
        self.messages = drafts.into_iter().map(DeliveryRecord::pending).collect();
        self.send_summary = SendSummary::default();
    }

    /// Record one delivery outcome against `messages[index]`.
    ///
    /// Returns `false` when the index is out of range. Counters increment
    /// unconditionally, so replaying an index double-counts.
    pub fn record_outcome(&mut self, index: usize, outcome: SendOutcome) -> bool {
        let Some(record) = self.messages.get_mut(index) else {
            return false;
        };
        record.status = outcome.status;
        record.error = outcome.error;
        record.sent_at = Some(Utc::now());
        match outcome.status {
            DeliveryStatus::Sent => self.send_summary.sent += 1,
            DeliveryStatus::Failed => self.send_summary.failed += 1,
            DeliveryStatus::Pending => {}
        }
        true
    }

    /// Revert every delivery record to pending and zero the summary.
    pub fn reset_deliveries(&mut self) {
        for record in &mut self.messages {
            record.status = DeliveryStatus::Pending;
            record.error = None;
            record.sent_at = None;
        }
        self.send_summary = SendSummary::default();
    }

    /// Indices of messages still pending, in original order.
    #[must_use]
    pub fn pending_indices(&self) -> Vec<usize> {
        self.messages
            .iter()
            .enumerate()
            .filter(|(_, record)| record.status == DeliveryStatus::Pending)
            .map(|(index, _)| index)
            .collect()
    }

    /// Count of messages still pending.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|record| record.status == DeliveryStatus::Pending)
            .count()
    }
}

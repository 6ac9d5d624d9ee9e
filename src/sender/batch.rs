//! One bounded, paced chunk of delivery attempts per invocation.
//!
//! This is explicitly not a background job: each call processes a single
//! batch and returns, and the client drives completion by calling again
//! until no pending records remain. That keeps the server free of
//! cross-request task lifecycle management.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::SendConfig;
use crate::models::{DeliveryStatus, JobStatus, SendOutcome, SendSummary};
use crate::sender::{AccessTokenProvider, Mailer, OutboundEmail};
use crate::store::JobStore;
use crate::{AppError, Result};

/// Smallest permitted batch size.
pub const MIN_BATCH_SIZE: usize = 1;
/// Largest permitted batch size.
pub const MAX_BATCH_SIZE: usize = 50;

/// Failure reason recorded when a message has no recipient.
const MISSING_RECIPIENT: &str = "Missing recipient";

/// Per-call overrides for batch size and pacing.
#[derive(Debug, Clone, Copy, Default, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BatchOptions {
    /// Requested batch size; clamped to `[1, 50]`.
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Requested inter-message delay in milliseconds.
    #[serde(default)]
    pub pace_ms: Option<u64>,
}

impl BatchOptions {
    fn resolve(self, defaults: SendConfig) -> (usize, u64) {
        let batch_size = self
            .batch_size
            .unwrap_or(defaults.default_batch_size)
            .clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE);
        let pace_ms = self.pace_ms.unwrap_or(defaults.default_pace_ms);
        (batch_size, pace_ms)
    }
}

/// Outcome of one orchestrator invocation.
#[derive(Debug, Clone, Copy, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BatchReport {
    /// Deliveries recorded as sent by this call.
    pub sent: u64,
    /// Deliveries recorded as failed by this call.
    pub failed: u64,
    /// Pending records remaining after this call.
    pub remaining: usize,
    /// Cumulative counters across all calls for this job.
    pub summary: SendSummary,
}

/// Dispatches one bounded batch of pending deliveries for a ready job.
pub struct BatchSender {
    tokens: Arc<dyn AccessTokenProvider>,
    mailer: Arc<dyn Mailer>,
    defaults: SendConfig,
}

impl BatchSender {
    /// Wire the orchestrator to its collaborators.
    #[must_use]
    pub fn new(
        tokens: Arc<dyn AccessTokenProvider>,
        mailer: Arc<dyn Mailer>,
        defaults: SendConfig,
    ) -> Self {
        Self {
            tokens,
            mailer,
            defaults,
        }
    }

    /// Send the next batch of pending messages for `job_id`.
    ///
    /// Selects pending records in their original order, obtains one
    /// credential for the whole batch, attempts each delivery with the
    /// configured pacing between items, and reconciles every outcome back
    /// into the store. A per-message failure is recorded against that
    /// message only and never aborts the batch.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown job,
    /// `AppError::NotReady` when the job is not in the `ready` state, and
    /// `AppError::Token` when no valid credential can be obtained; in the
    /// credential case no delivery was attempted.
    pub async fn send_batch(
        &self,
        store: &JobStore,
        job_id: &str,
        options: BatchOptions,
    ) -> Result<BatchReport> {
        let snapshot = store
            .get_job(job_id)
            .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;
        if snapshot.status != JobStatus::Ready {
            return Err(AppError::NotReady(format!(
                "job {job_id} has no finalized drafts to send"
            )));
        }

        let (batch_size, pace_ms) = options.resolve(self.defaults);
        let selected: Vec<usize> = snapshot.pending_indices().into_iter().take(batch_size).collect();

        // Credential failure aborts before any delivery is attempted.
        let token = self.tokens.access_token().await?;

        let mut sent: u64 = 0;
        let mut failed: u64 = 0;
        for (position, &index) in selected.iter().enumerate() {
            let record = &snapshot.messages[index];
            let outcome = if record.to.trim().is_empty() {
                SendOutcome::failed(MISSING_RECIPIENT)
            } else {
                let email = OutboundEmail {
                    to: record.to.clone(),
                    subject: record.subject.clone(),
                    body: record.body.clone(),
                };
                match self.mailer.send(token.clone(), email).await {
                    Ok(()) => SendOutcome::sent(),
                    Err(err) => {
                        warn!(job_id, index, %err, "delivery attempt failed");
                        SendOutcome::failed(err.to_string())
                    }
                }
            };

            if outcome.status == DeliveryStatus::Failed {
                failed += 1;
            } else {
                sent += 1;
            }
            store.record_send_outcome(job_id, index, outcome);

            // Fixed inter-message pacing; the trailing sleep is elided.
            if pace_ms > 0 && position + 1 < selected.len() {
                sleep(Duration::from_millis(pace_ms)).await;
            }
        }

        // The job can disappear mid-batch; outcomes already recorded were
        // no-ops in that case.
        let (remaining, summary) = store
            .get_job(job_id)
            .map_or((0, SendSummary::default()), |job| {
                (job.pending_count(), job.send_summary)
            });

        info!(job_id, sent, failed, remaining, "batch dispatched");

        Ok(BatchReport {
            sent,
            failed,
            remaining,
            summary,
        })
    }
}

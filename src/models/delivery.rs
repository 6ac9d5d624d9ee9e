//! Delivery record and preview types nested inside a job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status for one outbound email candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Not yet attempted.
    Pending,
    /// Accepted by the delivery capability.
    Sent,
    /// Delivery attempt failed.
    Failed,
}

/// Draft email content as finalized by the rewrite engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DraftMessage {
    /// Recipient address.
    #[serde(default)]
    pub to: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Plain-text body.
    #[serde(default)]
    pub body: String,
}

/// One outbound email candidate within a job.
///
/// Content fields are immutable once set via message replacement; only the
/// delivery outcome fields change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DeliveryRecord {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Current delivery status.
    pub status: DeliveryStatus,
    /// Failure reason, set only on `failed`.
    pub error: Option<String>,
    /// Timestamp of the delivery attempt that moved the record off `pending`.
    pub sent_at: Option<DateTime<Utc>>,
}

impl DeliveryRecord {
    /// Build a pending record from draft content.
    #[must_use]
    pub fn pending(draft: DraftMessage) -> Self {
        Self {
            to: draft.to,
            subject: draft.subject,
            body: draft.body,
            status: DeliveryStatus::Pending,
            error: None,
            sent_at: None,
        }
    }
}

/// Outcome of one delivery attempt, reconciled into the owning job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// Resulting status (`sent` or `failed`).
    pub status: DeliveryStatus,
    /// Failure reason when `failed`.
    pub error: Option<String>,
}

impl SendOutcome {
    /// Successful delivery outcome.
    #[must_use]
    pub fn sent() -> Self {
        Self {
            status: DeliveryStatus::Sent,
            error: None,
        }
    }

    /// Failed delivery outcome with a reason.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Failed,
            error: Some(reason.into()),
        }
    }
}

/// A draft sample surfaced to the client while the rewrite is in flight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Preview {
    /// Recipient address, trimmed.
    #[serde(default)]
    pub to: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Body excerpt.
    #[serde(default)]
    pub body: String,
}

impl Preview {
    /// Normalize a candidate preview: trim the recipient and drop entries
    /// where every field is empty.
    #[must_use]
    pub fn normalize(self) -> Option<Self> {
        let normalized = Self {
            to: self.to.trim().to_owned(),
            subject: self.subject,
            body: self.body,
        };
        if normalized.to.is_empty() && normalized.subject.is_empty() && normalized.body.is_empty() {
            None
        } else {
            Some(normalized)
        }
    }
}

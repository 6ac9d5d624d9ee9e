//! Domain models for rewrite/send jobs and their delivery records.

pub mod delivery;
pub mod job;
pub mod patch;

pub use delivery::{DeliveryRecord, DeliveryStatus, DraftMessage, Preview, SendOutcome};
pub use job::{Job, JobStatus, Progress, ProgressUpdate, SendSummary, StatusPatch};
pub use patch::Patch;

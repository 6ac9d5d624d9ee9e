//! Unit tests for model serde shapes.

use outreach_relay::models::{DeliveryStatus, DraftMessage, Job, JobStatus};

#[test]
fn job_status_serializes_to_snake_case() {
    let json = serde_json::to_string(&JobStatus::Queued).expect("serialize");
    assert_eq!(json, "\"queued\"");
    let json = serde_json::to_string(&JobStatus::Ready).expect("serialize");
    assert_eq!(json, "\"ready\"");
}

#[test]
fn job_status_round_trips() {
    for status in [
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Ready,
        JobStatus::Error,
    ] {
        let json = serde_json::to_string(&status).expect("serialize");
        let back: JobStatus = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, status);
    }
}

#[test]
fn unknown_status_fails_deserialization() {
    let result: Result<JobStatus, _> = serde_json::from_str("\"paused\"");
    assert!(result.is_err());
}

#[test]
fn delivery_status_serializes_to_snake_case() {
    let json = serde_json::to_string(&DeliveryStatus::Pending).expect("serialize");
    assert_eq!(json, "\"pending\"");
    let json = serde_json::to_string(&DeliveryStatus::Failed).expect("serialize");
    assert_eq!(json, "\"failed\"");
}

#[test]
fn draft_message_fields_default_to_empty() {
    let draft: DraftMessage = serde_json::from_str("{}").expect("deserialize");
    assert_eq!(draft.to, "");
    assert_eq!(draft.subject, "");
    assert_eq!(draft.body, "");
}

#[test]
fn new_job_timestamps_match() {
    let job = Job::new("job-1".into(), "user-1".into(), 3);
    assert_eq!(job.created_at, job.updated_at);
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.last_error, None);
}

#[test]
fn job_serde_round_trips() {
    let job = Job::new("job-1".into(), "user-1".into(), 3);
    let json = serde_json::to_string(&job).expect("serialize");
    let back: Job = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, job);
}

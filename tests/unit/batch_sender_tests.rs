//! Unit tests for the batch send orchestrator with stub collaborators.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use outreach_relay::config::SendConfig;
use outreach_relay::models::{DeliveryStatus, DraftMessage, JobStatus, StatusPatch};
use outreach_relay::sender::{
    AccessTokenProvider, BatchOptions, BatchSender, Mailer, OutboundEmail,
};
use outreach_relay::store::JobStore;
use outreach_relay::AppError;

struct StaticTokens;

impl AccessTokenProvider for StaticTokens {
    fn access_token(
        &self,
    ) -> Pin<Box<dyn Future<Output = outreach_relay::Result<String>> + Send + '_>> {
        Box::pin(async { Ok("test-token".to_owned()) })
    }
}

struct FailingTokens;

impl AccessTokenProvider for FailingTokens {
    fn access_token(
        &self,
    ) -> Pin<Box<dyn Future<Output = outreach_relay::Result<String>> + Send + '_>> {
        Box::pin(async { Err(AppError::Token("refresh token revoked".into())) })
    }
}

/// Mailer that records recipients and fails those listed in `fail_for`.
#[derive(Default)]
struct ScriptedMailer {
    fail_for: Vec<String>,
    delivered: Mutex<Vec<String>>,
}

impl ScriptedMailer {
    fn failing_for(recipients: &[&str]) -> Self {
        Self {
            fail_for: recipients.iter().map(|r| (*r).to_owned()).collect(),
            delivered: Mutex::new(Vec::new()),
        }
    }

    fn delivered(&self) -> Vec<String> {
        self.delivered.lock().expect("lock").clone()
    }
}

impl Mailer for ScriptedMailer {
    fn send(
        &self,
        _access_token: String,
        email: OutboundEmail,
    ) -> Pin<Box<dyn Future<Output = outreach_relay::Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.fail_for.contains(&email.to) {
                return Err(AppError::Delivery(format!("rejected for {}", email.to)));
            }
            self.delivered.lock().expect("lock").push(email.to);
            Ok(())
        })
    }
}

fn test_send_config() -> SendConfig {
    SendConfig {
        default_batch_size: 10,
        default_pace_ms: 0,
        preview_limit: 5,
    }
}

fn sender_with(mailer: Arc<ScriptedMailer>) -> BatchSender {
    BatchSender::new(Arc::new(StaticTokens), mailer, test_send_config())
}

fn ready_job(store: &JobStore, job_id: &str, message_count: usize) {
    store
        .create_job(job_id, "user-1", message_count as u64)
        .expect("create");
    let drafts: Vec<DraftMessage> = (1..=message_count)
        .map(|n| DraftMessage {
            to: format!("contact{n}@example.edu"),
            subject: format!("Intro {n}"),
            body: "Hello!".into(),
        })
        .collect();
    store.set_job_messages(job_id, drafts).expect("messages");
    store
        .mark_job_status(job_id, JobStatus::Ready, StatusPatch::default())
        .expect("ready");
}

#[tokio::test]
async fn one_batch_sends_exactly_batch_size_messages() {
    let store = JobStore::new();
    ready_job(&store, "job-1", 25);
    let sender = sender_with(Arc::new(ScriptedMailer::default()));

    let report = sender
        .send_batch(
            &store,
            "job-1",
            BatchOptions {
                batch_size: Some(10),
                pace_ms: Some(0),
            },
        )
        .await
        .expect("batch succeeds");

    assert_eq!(report.sent, 10);
    assert_eq!(report.failed, 0);
    assert_eq!(report.remaining, 15);
    assert_eq!(report.summary.sent + report.summary.failed, 10);
}

#[tokio::test]
async fn per_message_failure_is_isolated() {
    let store = JobStore::new();
    ready_job(&store, "job-1", 3);
    let mailer = Arc::new(ScriptedMailer::failing_for(&["contact2@example.edu"]));
    let sender = sender_with(Arc::clone(&mailer));

    let report = sender
        .send_batch(&store, "job-1", BatchOptions::default())
        .await
        .expect("batch succeeds");

    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.remaining, 0);

    let job = store.get_job("job-1").expect("job exists");
    assert_eq!(job.messages[0].status, DeliveryStatus::Sent);
    assert_eq!(job.messages[1].status, DeliveryStatus::Failed);
    assert!(job.messages[1]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("contact2@example.edu")));
    assert_eq!(job.messages[2].status, DeliveryStatus::Sent);
}

#[tokio::test]
async fn blank_recipient_fails_without_a_delivery_attempt() {
    let store = JobStore::new();
    store.create_job("job-1", "user-1", 2).expect("create");
    store
        .set_job_messages(
            "job-1",
            vec![
                DraftMessage {
                    to: "  ".into(),
                    subject: "No recipient".into(),
                    body: "Hi".into(),
                },
                DraftMessage {
                    to: "ok@example.edu".into(),
                    subject: "Fine".into(),
                    body: "Hi".into(),
                },
            ],
        )
        .expect("messages");
    store
        .mark_job_status("job-1", JobStatus::Ready, StatusPatch::default())
        .expect("ready");

    let mailer = Arc::new(ScriptedMailer::default());
    let sender = sender_with(Arc::clone(&mailer));
    let report = sender
        .send_batch(&store, "job-1", BatchOptions::default())
        .await
        .expect("batch succeeds");

    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(mailer.delivered(), vec!["ok@example.edu".to_owned()]);

    let job = store.get_job("job-1").expect("job exists");
    assert_eq!(job.messages[0].error.as_deref(), Some("Missing recipient"));
}

#[tokio::test]
async fn credential_failure_aborts_before_any_send() {
    let store = JobStore::new();
    ready_job(&store, "job-1", 3);
    let sender = BatchSender::new(
        Arc::new(FailingTokens),
        Arc::new(ScriptedMailer::default()),
        test_send_config(),
    );

    let result = sender
        .send_batch(&store, "job-1", BatchOptions::default())
        .await;
    assert!(matches!(result, Err(AppError::Token(_))));

    // No partial progress was recorded.
    let job = store.get_job("job-1").expect("job exists");
    assert_eq!(job.pending_count(), 3);
    assert_eq!(job.send_summary.sent, 0);
    assert_eq!(job.send_summary.failed, 0);
}

#[tokio::test]
async fn job_not_ready_is_rejected() {
    let store = JobStore::new();
    store.create_job("job-1", "user-1", 3).expect("create");
    let sender = sender_with(Arc::new(ScriptedMailer::default()));

    let result = sender
        .send_batch(&store, "job-1", BatchOptions::default())
        .await;
    assert!(matches!(result, Err(AppError::NotReady(_))));
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let store = JobStore::new();
    let sender = sender_with(Arc::new(ScriptedMailer::default()));

    let result = sender
        .send_batch(&store, "ghost", BatchOptions::default())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn requested_batch_size_is_clamped_to_fifty() {
    let store = JobStore::new();
    ready_job(&store, "job-1", 60);
    let sender = sender_with(Arc::new(ScriptedMailer::default()));

    let report = sender
        .send_batch(
            &store,
            "job-1",
            BatchOptions {
                batch_size: Some(500),
                pace_ms: Some(0),
            },
        )
        .await
        .expect("batch succeeds");

    assert_eq!(report.sent, 50);
    assert_eq!(report.remaining, 10);
}

#[tokio::test]
async fn repeated_calls_drain_the_job() {
    let store = JobStore::new();
    ready_job(&store, "job-1", 5);
    let sender = sender_with(Arc::new(ScriptedMailer::default()));
    let options = BatchOptions {
        batch_size: Some(2),
        pace_ms: Some(0),
    };

    let mut remaining = Vec::new();
    for _ in 0..3 {
        let report = sender
            .send_batch(&store, "job-1", options)
            .await
            .expect("batch succeeds");
        remaining.push(report.remaining);
    }
    assert_eq!(remaining, vec![3, 1, 0]);

    let job = store.get_job("job-1").expect("job exists");
    assert_eq!(job.send_summary.sent, 5);
    assert_eq!(job.pending_count(), 0);
}

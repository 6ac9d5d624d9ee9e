//! Gmail REST mailer: RFC 2822 composition and `messages/send` delivery.

use std::future::Future;
use std::pin::Pin;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde_json::json;
use tracing::debug;

use crate::sender::{Mailer, OutboundEmail};
use crate::{AppError, Result};

use super::sanitize_error_body;

/// Mailer delivering through the Gmail `users/me/messages/send` endpoint.
pub struct GmailMailer {
    client: reqwest::Client,
    endpoint: String,
}

impl GmailMailer {
    /// Create a mailer posting to the given send endpoint.
    #[must_use]
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

impl Mailer for GmailMailer {
    fn send(
        &self,
        access_token: String,
        email: OutboundEmail,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let raw = encode_raw_message(&email);
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&access_token)
                .json(&json!({ "raw": raw }))
                .send()
                .await
                .map_err(|err| AppError::Delivery(format!("gmail unreachable: {err}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Delivery(format!(
                    "gmail send rejected ({status}): {}",
                    sanitize_error_body(&body)
                )));
            }

            debug!(to = %email.to, "gmail message accepted");
            Ok(())
        })
    }
}

/// Compose the RFC 2822 message and wrap it in the URL-safe base64 `raw`
/// form the Gmail API expects.
#[must_use]
pub fn encode_raw_message(email: &OutboundEmail) -> String {
    let mime = format!(
        "To: {}\r\n\
         Subject: {}\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: text/plain; charset=\"UTF-8\"\r\n\
         Content-Transfer-Encoding: base64\r\n\
         \r\n\
         {}",
        email.to,
        encode_subject(&email.subject),
        STANDARD.encode(email.body.as_bytes()),
    );
    URL_SAFE_NO_PAD.encode(mime.as_bytes())
}

/// RFC 2047 B-encode a subject line when it is not plain ASCII.
#[must_use]
pub fn encode_subject(subject: &str) -> String {
    if subject.is_ascii() {
        subject.to_owned()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(subject.as_bytes()))
    }
}

//! Concrete Google collaborators behind the sender seams.

pub mod gmail;
pub mod oauth;

pub use gmail::GmailMailer;
pub use oauth::GoogleTokenProvider;

/// Maximum length for sanitized upstream error bodies kept in messages
/// and logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Truncate an upstream error body so token material and long HTML error
/// pages never flood logs or client-visible messages.
fn sanitize_error_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let truncated: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{truncated}... (truncated)")
    } else {
        body.to_owned()
    }
}

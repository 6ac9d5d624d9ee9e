//! Batch send orchestration and the collaborator seams it depends on.
//!
//! The orchestrator consumes two injected capabilities: an access-token
//! provider (refresh handled inside the provider) and a mailer that
//! delivers exactly one email. Production wires the Google adapters;
//! tests inject stubs.

pub mod batch;

use std::future::Future;
use std::pin::Pin;

use crate::Result;

pub use batch::{BatchOptions, BatchReport, BatchSender};

/// One outbound email handed to the delivery capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Provider of valid delivery credentials.
pub trait AccessTokenProvider: Send + Sync {
    /// Return a currently valid access token, refreshing first when the
    /// cached token is missing or expires within the safety margin.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Token`](crate::AppError::Token) when no refresh
    /// capability is available or the refresh exchange fails. The caller
    /// treats this as fatal for the whole batch.
    fn access_token(&self) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}

/// Capability that delivers exactly one email.
pub trait Mailer: Send + Sync {
    /// Attempt delivery of `email` using the given bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Delivery`](crate::AppError::Delivery) when the
    /// delivery capability rejects the message. Failures are isolated to
    /// the one message by the orchestrator.
    fn send(
        &self,
        access_token: String,
        email: OutboundEmail,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Inbound callback failed signature verification.
    Signature(String),
    /// Malformed request or callback payload.
    Payload(String),
    /// OAuth credential refresh or lookup failure.
    Token(String),
    /// Gmail API delivery failure.
    Delivery(String),
    /// Requested job does not exist.
    NotFound(String),
    /// Job exists but is not in a sendable state.
    NotReady(String),
    /// Job identifier already registered.
    AlreadyExists(String),
    /// Caller is not authorized to act on the requested job.
    Unauthorized(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Signature(msg) => write!(f, "signature: {msg}"),
            Self::Payload(msg) => write!(f, "payload: {msg}"),
            Self::Token(msg) => write!(f, "token: {msg}"),
            Self::Delivery(msg) => write!(f, "delivery: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::NotReady(msg) => write!(f, "not ready: {msg}"),
            Self::AlreadyExists(msg) => write!(f, "already exists: {msg}"),
            Self::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

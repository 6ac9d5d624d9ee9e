//! Shared-secret callback authentication.
//!
//! The workflow engine signs the raw request body with HMAC-SHA256 under
//! a shared secret and sends the hex digest in the signature header.
//! Verification runs before any store mutation and compares in constant
//! time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{AppError, Result};

/// Header carrying the hex-encoded HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "x-relay-signature";

type HmacSha256 = Hmac<Sha256>;

/// Verify a callback signature over the raw request body.
///
/// # Errors
///
/// Returns `AppError::Config` when no signing secret is configured, and
/// `AppError::Signature` when the header is missing, not valid hex, or
/// does not match the body digest.
pub fn verify_signature(secret: &str, body: &[u8], provided: Option<&str>) -> Result<()> {
    if secret.is_empty() {
        return Err(AppError::Config(
            "callback signing secret is not configured".into(),
        ));
    }
    let provided = provided
        .ok_or_else(|| AppError::Signature(format!("missing {SIGNATURE_HEADER} header")))?;
    let digest = hex::decode(provided.trim())
        .map_err(|_| AppError::Signature("signature is not valid hex".into()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Config("invalid signing secret".into()))?;
    mac.update(body);
    mac.verify_slice(&digest)
        .map_err(|_| AppError::Signature("signature mismatch".into()))
}

/// Produce the hex signature for a body, as the workflow engine would.
#[must_use]
pub fn sign(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length, so construction cannot fail.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keyring service name used for credential lookups.
const KEYRING_SERVICE: &str = "outreach-relay";

/// Nested Google OAuth / Gmail configuration.
///
/// The client secret and refresh token are loaded at runtime via the OS
/// keychain or environment variables, not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GoogleConfig {
    /// OAuth client identifier issued by the Google Cloud console.
    pub client_id: String,
    /// OAuth token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Gmail send endpoint for the authorized user.
    #[serde(default = "default_send_endpoint")]
    pub send_endpoint: String,
    /// OAuth client secret (populated at runtime).
    #[serde(skip)]
    pub client_secret: String,
    /// Long-lived refresh token for the sending account (populated at runtime).
    #[serde(skip)]
    pub refresh_token: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".into()
}

fn default_send_endpoint() -> String {
    "https://gmail.googleapis.com/gmail/v1/users/me/messages/send".into()
}

/// Batch send tuning knobs.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SendConfig {
    /// Deliveries attempted per send invocation when the caller does not
    /// specify a batch size.
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,
    /// Fixed delay between delivery attempts within a batch.
    #[serde(default = "default_pace_ms")]
    pub default_pace_ms: u64,
    /// Most-recent preview messages retained per job.
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
}

fn default_batch_size() -> usize {
    10
}

fn default_pace_ms() -> u64 {
    250
}

fn default_preview_limit() -> usize {
    5
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            default_batch_size: default_batch_size(),
            default_pace_ms: default_pace_ms(),
            preview_limit: default_preview_limit(),
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// HTTP port the API listens on.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Google OAuth / Gmail settings.
    pub google: GoogleConfig,
    /// Batch send tuning.
    #[serde(default)]
    pub send: SendConfig,
    /// Shared secret for callback signature verification (populated at runtime).
    #[serde(skip)]
    pub callback_secret: String,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load secrets from OS keychain with env-var fallback.
    ///
    /// Tries the `outreach-relay` keyring service first, then falls back to
    /// `CALLBACK_SIGNING_SECRET`, `GOOGLE_CLIENT_SECRET`, and
    /// `GOOGLE_REFRESH_TOKEN` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env vars provide
    /// the required values.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.callback_secret =
            load_credential("callback_signing_secret", "CALLBACK_SIGNING_SECRET").await?;
        self.google.client_secret =
            load_credential("google_client_secret", "GOOGLE_CLIENT_SECRET").await?;
        self.google.refresh_token =
            load_credential("google_refresh_token", "GOOGLE_REFRESH_TOKEN").await?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.google.client_id.trim().is_empty() {
            return Err(AppError::Config("google.client_id must not be empty".into()));
        }

        if self.send.default_batch_size == 0 || self.send.default_batch_size > 50 {
            return Err(AppError::Config(
                "send.default_batch_size must be between 1 and 50".into(),
            ));
        }

        if self.send.preview_limit == 0 {
            return Err(AppError::Config(
                "send.preview_limit must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // Try OS keychain first via spawn_blocking (keyring is synchronous I/O).
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    // Fallback to environment variable.
    env::var(env_key).map_err(|_| {
        AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))
    })
}

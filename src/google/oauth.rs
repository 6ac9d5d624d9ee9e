//! Refresh-ahead access token provider for the Gmail API.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::GoogleConfig;
use crate::sender::AccessTokenProvider;
use crate::{AppError, Result};

use super::sanitize_error_body;

/// Tokens expiring within this margin are refreshed before use.
const REFRESH_MARGIN_SECONDS: i64 = 60;

/// Fallback lifetime when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

/// Response from the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Access token provider backed by the Google OAuth refresh-token grant.
///
/// Caches the current access token with its expiry and refreshes through
/// the token endpoint when the cached token is absent or about to expire.
pub struct GoogleTokenProvider {
    client: reqwest::Client,
    config: GoogleConfig,
    cached: Mutex<Option<CachedToken>>,
}

impl GoogleTokenProvider {
    /// Create a provider for the given Google configuration.
    #[must_use]
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            cached: Mutex::new(None),
        }
    }

    fn cached_if_fresh(&self) -> Option<String> {
        let guard = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().and_then(|token| {
            let margin = Duration::seconds(REFRESH_MARGIN_SECONDS);
            (token.expires_at - Utc::now() > margin).then(|| token.value.clone())
        })
    }

    async fn refresh(&self) -> Result<String> {
        if self.config.refresh_token.is_empty() {
            return Err(AppError::Token(
                "no refresh token configured for the sending account".into(),
            ));
        }

        debug!("refreshing gmail access token");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", self.config.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.config.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|err| AppError::Token(format!("token endpoint unreachable: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Token(format!(
                "token refresh rejected ({status}): {}",
                sanitize_error_body(&body)
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| AppError::Token(format!("invalid token response: {err}")))?;

        let lifetime = token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS);
        let expires_at = Utc::now() + Duration::seconds(lifetime);
        {
            let mut guard = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
            *guard = Some(CachedToken {
                value: token.access_token.clone(),
                expires_at,
            });
        }

        info!(lifetime, "gmail access token refreshed");
        Ok(token.access_token)
    }
}

impl AccessTokenProvider for GoogleTokenProvider {
    fn access_token(&self) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move {
            if let Some(token) = self.cached_if_fresh() {
                return Ok(token);
            }
            self.refresh().await
        })
    }
}

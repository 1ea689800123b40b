//! Credential exchange with the remote authority.
//!
//! One `POST {api_url}/auth/login` round trip per call. No retries: a
//! failure comes back as `AuthError::Exchange` carrying the authority's
//! message, or the generic fallback when it gave none. This module never
//! touches storage or session state.

#[cfg(test)]
#[path = "exchange_test.rs"]
mod tests;

use std::time::Duration;

use serde_json::Value;

use crate::config::ExchangeTimeouts;
use crate::error::{AuthError, LOGIN_FAILED_FALLBACK};
use crate::types::{Credential, LoginResponse};

pub const LOGIN_PATH: &str = "/auth/login";

/// Trades a credential for a token and user record.
#[async_trait::async_trait]
pub trait CredentialExchange: Send + Sync {
    /// # Errors
    ///
    /// Returns `AuthError::Exchange` when the authority rejects the
    /// credential or cannot be reached.
    async fn exchange(&self, credential: &Credential) -> Result<LoginResponse, AuthError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// `reqwest`-backed exchange against a JSON authority.
pub struct HttpExchange {
    http: reqwest::Client,
    login_url: String,
}

impl HttpExchange {
    /// Build a client for the authority rooted at `api_url`
    /// (e.g. `http://127.0.0.1:4200/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_url: &str, timeouts: ExchangeTimeouts) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()?;
        Ok(Self { http, login_url: login_url(api_url) })
    }

    /// Endpoint this client posts to.
    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }
}

#[async_trait::async_trait]
impl CredentialExchange for HttpExchange {
    async fn exchange(&self, credential: &Credential) -> Result<LoginResponse, AuthError> {
        let response = self
            .http
            .post(&self.login_url)
            .json(credential)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, url = %self.login_url, "login request failed");
                AuthError::transport()
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::warn!(error = %e, status = status.as_u16(), "login response body unreadable");
            AuthError::Exchange { status: Some(status.as_u16()), message: LOGIN_FAILED_FALLBACK.to_owned() }
        })?;

        if !status.is_success() {
            return Err(AuthError::Exchange { status: Some(status.as_u16()), message: failure_message(&body) });
        }

        serde_json::from_str::<LoginResponse>(&body).map_err(|e| {
            tracing::warn!(error = %e, "login response did not match the expected shape");
            AuthError::Exchange { status: Some(status.as_u16()), message: LOGIN_FAILED_FALLBACK.to_owned() }
        })
    }
}

// =============================================================================
// HELPERS
// =============================================================================

pub(crate) fn login_url(api_url: &str) -> String {
    format!("{}{LOGIN_PATH}", api_url.trim_end_matches('/'))
}

/// Pull the human-readable reason out of a failure body.
///
/// Looks at `error.message`, then a top-level `message`, and falls back to
/// the generic text when neither is a non-empty string.
#[must_use]
pub fn failure_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return LOGIN_FAILED_FALLBACK.to_owned();
    };
    ["/error/message", "/message"]
        .iter()
        .filter_map(|pointer| parsed.pointer(pointer).and_then(Value::as_str))
        .find(|m| !m.trim().is_empty())
        .map_or_else(|| LOGIN_FAILED_FALLBACK.to_owned(), str::to_owned)
}

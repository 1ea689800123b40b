//! Session-layer configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:4200/api";
pub const DEFAULT_STATE_DIR: &str = ".daily-tools";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// File name of the durable tier inside the state directory.
pub const DURABLE_FILE_NAME: &str = "durable.json";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

/// Transport timeouts for the credential exchange. The session layer adds
/// no timeout policy of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for ExchangeTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub api_url: String,
    pub state_dir: PathBuf,
    pub timeouts: ExchangeTimeouts,
}

impl AuthConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `DAILY_TOOLS_API_URL`: authority base URL, default `http://127.0.0.1:4200/api`
    /// - `DAILY_TOOLS_STATE_DIR`: durable storage directory, default `.daily-tools`
    /// - `DAILY_TOOLS_REQUEST_TIMEOUT_SECS`: default 30
    /// - `DAILY_TOOLS_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key))
    }

    fn from_lookup<E>(lookup: impl Fn(&str) -> Result<String, E>) -> Result<Self, ConfigError> {
        let api_url = match lookup("DAILY_TOOLS_API_URL") {
            Ok(raw) => normalize_api_url(&raw).ok_or(ConfigError::Empty { var: "DAILY_TOOLS_API_URL" })?,
            Err(_) => DEFAULT_API_URL.to_owned(),
        };
        let state_dir = match lookup("DAILY_TOOLS_STATE_DIR") {
            Ok(raw) if raw.trim().is_empty() => return Err(ConfigError::Empty { var: "DAILY_TOOLS_STATE_DIR" }),
            Ok(raw) => PathBuf::from(raw.trim()),
            Err(_) => PathBuf::from(DEFAULT_STATE_DIR),
        };
        let timeouts = ExchangeTimeouts {
            request_secs: parse_or(&lookup, "DAILY_TOOLS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(&lookup, "DAILY_TOOLS_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Ok(Self { api_url, state_dir, timeouts })
    }

    /// Path of the durable tier's backing file.
    #[must_use]
    pub fn durable_path(&self) -> PathBuf {
        self.state_dir.join(DURABLE_FILE_NAME)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            timeouts: ExchangeTimeouts::default(),
        }
    }
}

/// Trim whitespace and trailing slashes; `None` when nothing is left.
#[must_use]
pub fn normalize_api_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() { None } else { Some(trimmed.to_owned()) }
}

fn parse_or<E>(lookup: &impl Fn(&str) -> Result<String, E>, key: &str, default: u64) -> u64 {
    match lookup(key) {
        Ok(raw) => raw.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

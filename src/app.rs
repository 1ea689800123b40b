//! Wiring for the shell: one session store and the guard that reads it.

use std::sync::Arc;

use auth::config::AuthConfig;
use auth::{CredentialExchange, HttpExchange, RouteGuard, RouteTable, SessionStore, Storage, StorageError};

use crate::CliError;

pub struct App {
    pub session: SessionStore,
    pub guard: RouteGuard,
}

impl App {
    /// Build the HTTP exchange and file-backed storage described by
    /// `config`, then rehydrate the session.
    pub fn from_config(config: &AuthConfig) -> Result<Self, CliError> {
        let exchange = HttpExchange::new(&config.api_url, config.timeouts)?;
        tracing::debug!(login_url = exchange.login_url(), state = %config.durable_path().display(), "session shell configured");
        Ok(Self::with_parts(Storage::with_file(config.durable_path()), Arc::new(exchange))?)
    }

    pub fn with_parts(storage: Storage, exchange: Arc<dyn CredentialExchange>) -> Result<Self, StorageError> {
        let session = SessionStore::new(storage, exchange);
        session.initialize()?;
        let guard = RouteGuard::new(session.clone(), RouteTable::default_routes());
        Ok(Self { session, guard })
    }
}

//! Session state store: the single source of truth for who is signed in.
//!
//! SYSTEM CONTEXT
//! ==============
//! Constructed once per running application and handed by reference (or
//! cheap clone) to the login flow, the route guard, and anything else that
//! reads identity. There is no global instance.
//!
//! DESIGN
//! ======
//! In-memory state lives in a `tokio::sync::watch` channel. Reads borrow the
//! current value; subscribers hold a `Receiver` and unregister by dropping
//! it. Every write goes durable-first, then publishes, so the persisted
//! record and the in-memory session agree as soon as an operation returns.
//! Publishing uses `send_replace`, which succeeds with zero subscribers: a
//! login that resolves after its view is gone still lands safely.
//!
//! TRADE-OFFS
//! ==========
//! Rehydration prefers token presence over user fidelity. A stored token
//! with an unreadable user record still counts as signed in; the bad record
//! is dropped and `current_user` stays empty until the next login.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{AuthError, StorageError};
use crate::exchange::CredentialExchange;
use crate::storage::Storage;
use crate::types::{Credential, Session, User};

/// Durable key holding the raw token string.
pub const TOKEN_KEY: &str = "authToken";
/// Durable key holding the JSON-serialized user record.
pub const USER_KEY: &str = "user";

/// Published session value. Authenticated iff a token is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Explicitly constructed session context. Clones share state.
#[derive(Clone)]
pub struct SessionStore {
    storage: Storage,
    exchange: Arc<dyn CredentialExchange>,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionStore {
    /// Create a store with an empty session. Call [`SessionStore::initialize`]
    /// to rehydrate from durable storage.
    #[must_use]
    pub fn new(storage: Storage, exchange: Arc<dyn CredentialExchange>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { storage, exchange, state: Arc::new(state) }
    }

    /// Rehydrate from the durable tier.
    ///
    /// Safe to call again; each call re-reads storage and republishes.
    ///
    /// # Errors
    ///
    /// Returns an error only if the durable medium itself fails.
    pub fn initialize(&self) -> Result<(), StorageError> {
        let token = self
            .storage
            .get_item(TOKEN_KEY)?
            .filter(|t| !t.is_empty());

        let Some(token) = token else {
            if self.storage.get_item(USER_KEY)?.is_some() {
                tracing::debug!("dropping stored user without a token");
                self.storage.remove_item(USER_KEY)?;
            }
            self.state.send_replace(SessionState::default());
            return Ok(());
        };

        let user = match self.storage.get_item(USER_KEY)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "stored user record unreadable; keeping token only");
                    self.storage.remove_item(USER_KEY)?;
                    None
                }
            },
            None => None,
        };

        tracing::debug!(user_id = user.as_ref().map(|u| u.id.as_str()), "session rehydrated");
        self.state.send_replace(SessionState { token: Some(token), user });
        Ok(())
    }

    /// Exchange `credential` for a session and make it current.
    ///
    /// On failure the previous session, if any, is left untouched. A write
    /// that fails halfway restores the prior durable record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Exchange` if the authority rejects the credential
    /// or is unreachable, and `AuthError::Storage` if the session cannot be
    /// persisted.
    pub async fn login(&self, credential: &Credential) -> Result<Session, AuthError> {
        let response = self.exchange.exchange(credential).await?;
        let session = Session::from(response);

        let user_json = serde_json::to_string(&session.user).map_err(StorageError::from)?;
        let prior_token = self.storage.get_item(TOKEN_KEY)?;
        let prior_user = self.storage.get_item(USER_KEY)?;
        let written = self
            .storage
            .set_item(TOKEN_KEY, &session.token)
            .and_then(|()| self.storage.set_item(USER_KEY, &user_json));
        if let Err(e) = written {
            tracing::warn!(error = %e, "session write failed; restoring prior record");
            self.rollback(prior_token.as_deref(), prior_user.as_deref());
            return Err(e.into());
        }

        self.state.send_replace(SessionState {
            token: Some(session.token.clone()),
            user: Some(session.user.clone()),
        });
        tracing::info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    /// Clear the session from storage and memory. Idempotent.
    ///
    /// In-memory state is cleared even if storage removal fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable medium cannot remove the keys.
    pub fn logout(&self) -> Result<(), StorageError> {
        let removed = self
            .storage
            .remove_item(TOKEN_KEY)
            .and_then(|()| self.storage.remove_item(USER_KEY));

        let previous = self.state.send_replace(SessionState::default());
        if let Some(user) = previous.user {
            tracing::info!(user_id = %user.id, "signed out");
        }
        removed
    }

    /// Put the durable keys back as they were before a failed login. If that
    /// fails too, drop both keys and sign out so memory still matches.
    fn rollback(&self, token: Option<&str>, user: Option<&str>) {
        let restored = restore(&self.storage, TOKEN_KEY, token).and_then(|()| restore(&self.storage, USER_KEY, user));
        let Err(e) = restored else {
            return;
        };
        tracing::warn!(error = %e, "prior session record not restored; signing out");
        if let Err(e) = self.storage.remove_item(TOKEN_KEY).and_then(|()| self.storage.remove_item(USER_KEY)) {
            tracing::warn!(error = %e, "session keys not removed");
        }
        self.state.send_replace(SessionState::default());
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    /// True iff a user is present and carries `role`. Never an error.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.state
            .borrow()
            .user
            .as_ref()
            .is_some_and(|u| u.has_role(role))
    }

    /// Copy of the full published state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Register for change notifications. Drop the receiver to unregister.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    /// Storage tiers this store writes through.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

fn restore(storage: &Storage, key: &str, value: Option<&str>) -> Result<(), StorageError> {
    match value {
        Some(value) => storage.set_item(key, value),
        None => storage.remove_item(key),
    }
}

//! Scripted credential exchange and fixtures shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::error::AuthError;
use crate::exchange::CredentialExchange;
use crate::session::SessionStore;
use crate::storage::Storage;
use crate::types::{Credential, LoginResponse, User};

pub const TEST_TOKEN: &str = "fake-jwt-token-for-testing";

pub fn test_user() -> User {
    serde_json::from_value(serde_json::json!({
        "id": "test-user-1",
        "email": "test@example.com",
        "name": "Test User",
        "roles": ["user"],
        "createdAt": "2025-01-01T00:00:00.000Z",
        "updatedAt": "2025-01-01T00:00:00.000Z"
    }))
    .unwrap()
}

pub fn admin_user() -> User {
    User { id: "admin-1".to_owned(), name: "Admin".to_owned(), roles: vec!["user".to_owned(), "admin".to_owned()], ..test_user() }
}

pub fn test_credentials() -> Credential {
    Credential::new("test@example.com", "password123")
}

#[derive(Clone)]
pub enum Reply {
    Success(LoginResponse),
    Reject { status: u16, message: String },
    Unreachable,
}

pub struct MockExchange {
    reply: Mutex<Reply>,
    calls: AtomicUsize,
    last_email: Mutex<Option<String>>,
    gate: Option<Arc<Notify>>,
}

impl MockExchange {
    pub fn new(reply: Reply) -> Self {
        Self { reply: Mutex::new(reply), calls: AtomicUsize::new(0), last_email: Mutex::new(None), gate: None }
    }

    pub fn succeeding() -> Self {
        Self::new(Reply::Success(LoginResponse { token: TEST_TOKEN.to_owned(), user: test_user() }))
    }

    pub fn rejecting(message: &str) -> Self {
        Self::new(Reply::Reject { status: 401, message: message.to_owned() })
    }

    /// Hold every exchange until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_email(&self) -> Option<String> {
        self.last_email.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CredentialExchange for MockExchange {
    async fn exchange(&self, credential: &Credential) -> Result<LoginResponse, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_email.lock().unwrap() = Some(credential.email.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            Reply::Success(response) => Ok(response),
            Reply::Reject { status, message } => Err(AuthError::Exchange { status: Some(status), message }),
            Reply::Unreachable => Err(AuthError::transport()),
        }
    }
}

/// Store over fresh in-memory tiers, plus a handle to its exchange.
pub fn store_with(exchange: MockExchange) -> (SessionStore, Arc<MockExchange>) {
    let exchange = Arc::new(exchange);
    let store = SessionStore::new(Storage::in_memory(), exchange.clone());
    (store, exchange)
}

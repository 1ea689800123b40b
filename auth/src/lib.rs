//! # auth
//!
//! Client-side session layer for the Daily Tools dashboard.
//!
//! Decides whether the visitor is signed in, trades credentials for a
//! session token, keeps that token across restarts, exposes the current
//! identity to the rest of the application, and tears the session down on
//! logout.
//!
//! DESIGN
//! ======
//! Components are leaf-first: `storage` knows nothing about sessions,
//! `exchange` knows nothing about storage, and `session::SessionStore` is the
//! only writer of session data. `login` drives the form affordances and
//! `guard` gates navigation on live session state.

pub mod config;
pub mod error;
pub mod exchange;
pub mod guard;
pub mod login;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(test)]
#[path = "mock_test.rs"]
mod mock;

pub use error::{AuthError, StorageError, ValidationError};
pub use exchange::{CredentialExchange, HttpExchange};
pub use guard::{Navigation, Navigator, RouteGuard, RouteTable};
pub use login::{LoginAttemptState, LoginAttemptTracker, LoginForm, SubmitOutcome};
pub use session::{SessionState, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore, Storage};
pub use types::{Credential, LoginResponse, Session, User};

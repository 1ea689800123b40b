//! Login form validation and the attempt tracker behind the login view.
//!
//! SYSTEM CONTEXT
//! ==============
//! Purely local view state; nothing here is persisted. The tracker drives
//! the session store's `login` and reports the outcome so the caller can
//! navigate. It never navigates itself.
//!
//! DESIGN
//! ======
//! `Idle -> Submitting -> Idle(success | error)`. The in-flight gate is the
//! `is_loading` flag, checked and set in one `send_if_modified` call before
//! dispatch, so a second submit while an exchange is pending returns
//! `SubmitOutcome::Busy` without touching the network. A disabled submit
//! button is a consequence of that flag, not the mechanism.
//!
//! `attempt_count` is advisory: it only grows on failures and is cleared by
//! `reset_attempts`, `reset`, or a successful login. No lockout reads it.

#[cfg(test)]
#[path = "login_test.rs"]
mod tests;

use tokio::sync::watch;

use crate::error::ValidationError;
use crate::session::SessionStore;
use crate::types::{Credential, Session};

pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// FORM
// =============================================================================

/// Trim and lowercase an email, rejecting anything that is not a single
/// `local@domain` with non-empty dot-separated domain labels.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
        return None;
    }
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || domain.split('.').any(str::is_empty) {
        return None;
    }
    Some(normalized)
}

/// Per-field validation failures, shown inline next to each input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub email: Option<ValidationError>,
    pub password: Option<ValidationError>,
}

impl FieldErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }

    /// First failure in form order.
    #[must_use]
    pub fn first(&self) -> Option<ValidationError> {
        self.email.or(self.password)
    }
}

/// Raw input of the login form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginForm {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }

    /// Check both fields and build the credential to send. The email is
    /// checked in normalized form but sent trimmed, otherwise as typed.
    ///
    /// # Errors
    ///
    /// Returns every field that failed its local check.
    pub fn validate(&self) -> Result<Credential, FieldErrors> {
        let email = normalize_email(&self.email).map(|_| self.email.trim());
        let password_error = if self.password.is_empty() {
            Some(ValidationError::MissingPassword)
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            Some(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN })
        } else {
            None
        };

        match (email, password_error) {
            (Some(email), None) => Ok(Credential::new(email, self.password.as_str())),
            (email, password) => Err(FieldErrors {
                email: email.is_none().then_some(ValidationError::InvalidEmail),
                password,
            }),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

// =============================================================================
// TRACKER
// =============================================================================

/// Observable state of the login view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginAttemptState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub attempt_count: u32,
}

/// Result of one press of the submit button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Signed in; the caller should navigate away.
    Authenticated(Session),
    /// The exchange failed; the message is now in `error`.
    Failed(String),
    /// An exchange is already in flight; nothing was sent.
    Busy,
    /// Local checks failed; nothing was sent.
    Invalid(FieldErrors),
}

/// Ephemeral state machine for one login view.
#[derive(Debug)]
pub struct LoginAttemptTracker {
    state: watch::Sender<LoginAttemptState>,
}

impl Default for LoginAttemptTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginAttemptTracker {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(LoginAttemptState::default());
        Self { state }
    }

    #[must_use]
    pub fn state(&self) -> LoginAttemptState {
        self.state.borrow().clone()
    }

    /// Register for changes. Drop the receiver to unregister.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoginAttemptState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.state.borrow().attempt_count
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.state.send_modify(|s| s.is_loading = is_loading);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.state.send_modify(|s| s.error = error);
    }

    pub fn increment_attempt(&self) {
        self.state.send_modify(|s| s.attempt_count = s.attempt_count.saturating_add(1));
    }

    pub fn reset_attempts(&self) {
        self.state.send_modify(|s| s.attempt_count = 0);
    }

    /// Back to defaults, as when the login view is torn down.
    pub fn reset(&self) {
        self.state.send_replace(LoginAttemptState::default());
    }

    /// Whether the submit affordance should be enabled for `form`.
    #[must_use]
    pub fn submit_enabled(&self, form: &LoginForm) -> bool {
        !self.is_loading() && form.is_valid()
    }

    #[must_use]
    pub fn submit_label(&self) -> &'static str {
        if self.is_loading() { "Logging in..." } else { "Login" }
    }

    /// Validate `form`, then run one credential exchange through `store`.
    pub async fn submit(&self, store: &SessionStore, form: &LoginForm) -> SubmitOutcome {
        if self.is_loading() {
            return SubmitOutcome::Busy;
        }
        let credential = match form.validate() {
            Ok(credential) => credential,
            Err(errors) => return SubmitOutcome::Invalid(errors),
        };
        let Some(in_flight) = self.begin() else {
            tracing::debug!("login submit ignored; exchange already in flight");
            return SubmitOutcome::Busy;
        };

        match store.login(&credential).await {
            Ok(session) => {
                in_flight.finish(|s| *s = LoginAttemptState::default());
                SubmitOutcome::Authenticated(session)
            }
            Err(e) => {
                let message = e.message();
                tracing::warn!(status = e.status(), error = %e, "login attempt failed");
                let shown = message.clone();
                in_flight.finish(move |s| {
                    s.is_loading = false;
                    s.error = Some(shown);
                    s.attempt_count = s.attempt_count.saturating_add(1);
                });
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Claim the in-flight slot: set loading and clear the previous error.
    fn begin(&self) -> Option<InFlight<'_>> {
        let claimed = self.state.send_if_modified(|s| {
            if s.is_loading {
                return false;
            }
            s.is_loading = true;
            s.error = None;
            true
        });
        claimed.then_some(InFlight { state: &self.state, finished: false })
    }
}

/// Clears `is_loading` if a submit is dropped before the exchange resolves.
struct InFlight<'a> {
    state: &'a watch::Sender<LoginAttemptState>,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self, apply: impl FnOnce(&mut LoginAttemptState)) {
        self.finished = true;
        self.state.send_modify(apply);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.state.send_modify(|s| s.is_loading = false);
        }
    }
}

//! Error taxonomy for the session layer.
//!
//! ERROR HANDLING
//! ==============
//! Every authentication failure is terminal for its attempt; nothing here
//! retries. `AuthError::message` is the one string the login form shows.
//! Storage failures are the underlying medium raising, and are rare enough
//! that callers treat them as unexpected.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Message shown when the authority gives no reason for a failed login.
pub const LOGIN_FAILED_FALLBACK: &str = "Login failed. Please try again.";

// =============================================================================
// STORAGE
// =============================================================================

/// Failures raised by a storage medium.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage io failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized before being stored.
    #[error("storage encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Local credential checks that fail before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a valid email")]
    InvalidEmail,
    #[error("Password is required")]
    MissingPassword,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

// =============================================================================
// AUTH
// =============================================================================

/// Failure of a login attempt.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The authority rejected the credential, or could not be reached.
    /// `status` is absent when the request never produced a response.
    #[error("{message}")]
    Exchange { status: Option<u16>, message: String },

    /// The credential failed local checks.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The session could not be written through to durable storage.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Network or transport failure with no response from the authority.
    #[must_use]
    pub fn transport() -> Self {
        Self::Exchange { status: None, message: LOGIN_FAILED_FALLBACK.to_owned() }
    }

    /// Human-readable message for the login form.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Exchange { message, .. } => message.clone(),
            Self::Validation(e) => e.to_string(),
            Self::Storage(_) => LOGIN_FAILED_FALLBACK.to_owned(),
        }
    }

    /// HTTP status returned by the authority, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Exchange { status, .. } => *status,
            Self::Validation(_) | Self::Storage(_) => None,
        }
    }
}

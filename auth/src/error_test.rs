use super::*;

#[test]
fn transport_uses_generic_message() {
    let err = AuthError::transport();
    assert_eq!(err.message(), LOGIN_FAILED_FALLBACK);
    assert_eq!(err.status(), None);
}

#[test]
fn exchange_message_is_verbatim() {
    let err = AuthError::Exchange { status: Some(401), message: "Invalid credentials".to_owned() };
    assert_eq!(err.message(), "Invalid credentials");
    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(err.status(), Some(401));
}

#[test]
fn validation_message_matches_form_copy() {
    let err = AuthError::from(ValidationError::InvalidEmail);
    assert_eq!(err.message(), "Please enter a valid email");
    assert_eq!(
        ValidationError::PasswordTooShort { min: 6 }.to_string(),
        "Password must be at least 6 characters"
    );
}

#[test]
fn storage_failure_hides_io_detail_from_user() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err = AuthError::from(StorageError::Io { path: "/tmp/x".to_owned(), source: io });
    assert_eq!(err.message(), LOGIN_FAILED_FALLBACK);
    assert!(err.status().is_none());
}

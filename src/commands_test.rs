use std::sync::Arc;

use auth::Storage;

use super::*;
use crate::mock_authority::tests::{exchange_for, spawn_authority};

async fn app() -> App {
    let addr = spawn_authority().await;
    App::with_parts(Storage::in_memory(), Arc::new(exchange_for(addr))).unwrap()
}

#[tokio::test]
async fn login_welcomes_user_and_lands_on_dashboard() {
    let app = app().await;
    let out = login(&app, "test@example.com", "password123").await.unwrap();
    assert_eq!(out, "Welcome, Test User! (dashboard)");
    assert!(app.session.is_authenticated());
    assert_eq!(has_role(&app, "user"), "true");
    assert_eq!(has_role(&app, "admin"), "false");
}

#[tokio::test]
async fn rejected_login_reports_authority_message() {
    let app = app().await;
    let err = login(&app, "wrong@example.com", "wrongpassword").await.unwrap_err();
    assert!(matches!(err, CliError::LoginFailed(ref m) if m == "Invalid credentials"));
    assert!(!app.session.is_authenticated());
}

#[tokio::test]
async fn invalid_form_is_a_validation_error() {
    let app = app().await;
    let err = login(&app, "not-an-email", "password123").await.unwrap_err();
    assert!(matches!(err, CliError::Validation(ValidationError::InvalidEmail)));
    assert_eq!(err.to_string(), "Please enter a valid email");
}

#[tokio::test]
async fn whoami_and_status_follow_the_session() {
    let app = app().await;
    assert_eq!(whoami(&app).unwrap(), "not signed in");
    assert_eq!(status(&app), "authenticated: false\nroles: ");

    login(&app, "test@example.com", "password123").await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&whoami(&app).unwrap()).unwrap();
    assert_eq!(json["id"], "test-user-1");
    assert_eq!(status(&app), "authenticated: true\nroles: user");

    assert_eq!(logout(&app).unwrap(), "Signed out.");
    assert_eq!(whoami(&app).unwrap(), "not signed in");
}

#[tokio::test]
async fn visit_reports_redirects_for_signed_out_users() {
    let app = app().await;
    assert_eq!(visit(&app, "/"), "auth/login (redirected from dashboard)");
    assert_eq!(visit(&app, "/converter"), "converter");

    login(&app, "test@example.com", "password123").await.unwrap();
    assert_eq!(visit(&app, "/"), "dashboard");
}

#[tokio::test]
async fn token_only_session_is_signed_in_without_profile() {
    let addr = spawn_authority().await;
    let storage = Storage::in_memory();
    storage.set_item(auth::session::TOKEN_KEY, "t").unwrap();
    let app = App::with_parts(storage, Arc::new(exchange_for(addr))).unwrap();
    assert_eq!(whoami(&app).unwrap(), "signed in (profile unavailable)");
    assert_eq!(visit(&app, "/dashboard"), "dashboard");
}

#[test]
fn session_survives_restart_through_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = auth::config::AuthConfig { state_dir: dir.path().to_path_buf(), ..auth::config::AuthConfig::default() };
    let first = App::from_config(&config).unwrap();
    first.session.storage().set_item(auth::session::TOKEN_KEY, "persisted").unwrap();

    let second = App::from_config(&config).unwrap();
    assert!(second.session.is_authenticated());
    assert_eq!(second.session.token().as_deref(), Some("persisted"));
}

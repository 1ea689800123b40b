use std::net::SocketAddr;

use auth::config::ExchangeTimeouts;
use auth::{Credential, CredentialExchange, HttpExchange};

use super::*;

pub(crate) async fn spawn_authority() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });
    addr
}

pub(crate) fn exchange_for(addr: SocketAddr) -> HttpExchange {
    HttpExchange::new(&format!("http://{addr}/api"), ExchangeTimeouts { request_secs: 5, connect_secs: 2 }).unwrap()
}

#[tokio::test]
async fn fixture_credentials_get_token_and_user() {
    let addr = spawn_authority().await;
    let response = exchange_for(addr)
        .exchange(&Credential::new(FIXTURE_EMAIL, FIXTURE_PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.token, FIXTURE_TOKEN);
    assert_eq!(response.user.name, "Test User");
    assert!(response.user.has_role("user"));
}

#[tokio::test]
async fn other_credentials_are_rejected_with_message() {
    let addr = spawn_authority().await;
    let err = exchange_for(addr)
        .exchange(&Credential::new("wrong@example.com", "wrongpassword"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.message(), "Invalid credentials");
}

#[tokio::test]
async fn healthz_answers_ok() {
    let addr = spawn_authority().await;
    let body = reqwest::get(format!("http://{addr}/healthz")).await.unwrap().text().await.unwrap();
    assert_eq!(body, "ok");
}

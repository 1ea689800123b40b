//! Local stand-in for the credential authority.
//!
//! Accepts exactly one fixture account and answers everything else with
//! the authority's 401 shape. Useful for manual end-to-end runs of the
//! shell against `http://127.0.0.1:<port>/api`.

#[cfg(test)]
#[path = "mock_authority_test.rs"]
pub(crate) mod tests;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const FIXTURE_EMAIL: &str = "test@example.com";
pub const FIXTURE_PASSWORD: &str = "password123";
pub const FIXTURE_TOKEN: &str = "fake-jwt-token-for-testing";

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

fn fixture_user() -> Value {
    json!({
        "id": "test-user-1",
        "email": FIXTURE_EMAIL,
        "name": "Test User",
        "roles": ["user"],
        "createdAt": "2025-01-01T00:00:00.000Z",
        "updatedAt": "2025-01-01T00:00:00.000Z"
    })
}

async fn login(Json(body): Json<LoginBody>) -> Response {
    if body.email == FIXTURE_EMAIL && body.password == FIXTURE_PASSWORD {
        tracing::info!(email = %body.email, "mock authority issued token");
        return Json(json!({ "token": FIXTURE_TOKEN, "user": fixture_user() })).into_response();
    }
    tracing::info!(email = %body.email, "mock authority rejected credentials");
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": { "message": "Invalid credentials" } }))).into_response()
}

async fn healthz() -> &'static str {
    "ok"
}

pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/login", post(login))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn serve(port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "mock authority listening");
    axum::serve(listener, router()).await
}

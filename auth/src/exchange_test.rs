use super::*;

// =============================================================
// failure_message
// =============================================================

#[test]
fn failure_message_reads_nested_error() {
    let body = r#"{"error":{"message":"Invalid credentials"}}"#;
    assert_eq!(failure_message(body), "Invalid credentials");
}

#[test]
fn failure_message_falls_back_to_top_level_message() {
    let body = r#"{"message":"Account locked"}"#;
    assert_eq!(failure_message(body), "Account locked");
}

#[test]
fn failure_message_prefers_nested_over_top_level() {
    let body = r#"{"error":{"message":"nested"},"message":"top"}"#;
    assert_eq!(failure_message(body), "nested");
}

#[test]
fn failure_message_generic_for_empty_or_foreign_bodies() {
    for body in ["", "<html>502</html>", "{}", r#"{"error":"nope"}"#, r#"{"error":{"message":"  "}}"#] {
        assert_eq!(failure_message(body), LOGIN_FAILED_FALLBACK, "body {body:?}");
    }
}

// =============================================================
// login_url
// =============================================================

#[test]
fn login_url_trims_trailing_slash() {
    assert_eq!(login_url("http://localhost:4200/api/"), "http://localhost:4200/api/auth/login");
    assert_eq!(login_url("http://localhost:4200/api"), "http://localhost:4200/api/auth/login");
}

#[test]
fn http_exchange_builds_with_timeouts() {
    let client = HttpExchange::new("http://127.0.0.1:1/api", ExchangeTimeouts::default()).unwrap();
    assert_eq!(client.login_url(), "http://127.0.0.1:1/api/auth/login");
}

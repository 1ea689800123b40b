use super::*;

#[test]
fn mock_authority_parses_without_session_flags() {
    let cli = Cli::try_parse_from(["daily-tools", "mock-authority", "--port", "4300"]).unwrap();
    assert!(matches!(cli.command, Command::MockAuthority { port: 4300 }));
    assert!(cli.api_url.is_none());
}

#[test]
fn visit_parses_path_argument() {
    let cli = Cli::try_parse_from(["daily-tools", "visit", "/dashboard"]).unwrap();
    assert!(matches!(cli.command, Command::Visit { ref path } if path == "/dashboard"));
}

#[test]
fn open_app_applies_command_line_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let app = open_app(Some("http://127.0.0.1:9/api/"), Some(dir.path())).unwrap();
    assert!(!app.session.is_authenticated());

    app.session.storage().set_item(auth::session::TOKEN_KEY, "t").unwrap();
    assert!(dir.path().join(auth::config::DURABLE_FILE_NAME).exists());
}

#[test]
fn open_app_rejects_blank_api_url() {
    let dir = tempfile::tempdir().unwrap();
    let err = open_app(Some("  "), Some(dir.path())).err().unwrap();
    assert!(matches!(err, CliError::Config(ConfigError::Empty { var: "DAILY_TOOLS_API_URL" })));
}

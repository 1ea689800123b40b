mod app;
mod commands;
mod mock_authority;

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

use std::path::{Path, PathBuf};

use auth::config::{AuthConfig, ConfigError};
use auth::{StorageError, ValidationError};
use clap::{Parser, Subcommand};

use crate::app::App;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    LoginFailed(String),
    #[error("a login is already in progress")]
    Busy,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "daily-tools", about = "Daily Tools session shell")]
struct Cli {
    #[arg(long, env = "DAILY_TOOLS_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "DAILY_TOOLS_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange credentials for a session and persist it.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DAILY_TOOLS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    Status,
    HasRole {
        role: String,
    },
    /// Print the view a navigation to `path` lands on.
    Visit {
        path: String,
    },
    /// Serve a local authority that accepts the fixture credentials.
    MockAuthority {
        #[arg(long, default_value_t = 4200)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let Cli { api_url, state_dir, command } = Cli::parse();
    let open = || open_app(api_url.as_deref(), state_dir.as_deref());

    let output = match command {
        Command::MockAuthority { port } => {
            mock_authority::serve(port).await?;
            return Ok(());
        }
        Command::Login { email, password } => commands::login(&open()?, &email, &password).await?,
        Command::Logout => commands::logout(&open()?)?,
        Command::Whoami => commands::whoami(&open()?)?,
        Command::Status => commands::status(&open()?),
        Command::HasRole { role } => commands::has_role(&open()?, &role),
        Command::Visit { path } => commands::visit(&open()?, &path),
    };
    println!("{output}");
    Ok(())
}

/// Environment config with command-line overrides applied, then the
/// rehydrated session shell.
fn open_app(api_url: Option<&str>, state_dir: Option<&Path>) -> Result<App, CliError> {
    let mut config = AuthConfig::from_env()?;
    if let Some(api_url) = api_url {
        config.api_url = auth::config::normalize_api_url(api_url)
            .ok_or(ConfigError::Empty { var: "DAILY_TOOLS_API_URL" })?;
    }
    if let Some(state_dir) = state_dir {
        config.state_dir = state_dir.to_path_buf();
    }
    App::from_config(&config)
}

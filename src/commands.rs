//! Shell commands. Each returns the text to print so tests can check it.

#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;

use auth::guard::DASHBOARD_ROUTE;
use auth::{LoginAttemptTracker, LoginForm, Navigation, Navigator, SubmitOutcome, ValidationError};

use crate::CliError;
use crate::app::App;

/// Submit the login form and land on the dashboard.
pub async fn login(app: &App, email: &str, password: &str) -> Result<String, CliError> {
    let tracker = LoginAttemptTracker::new();
    match tracker.submit(&app.session, &LoginForm::new(email, password)).await {
        SubmitOutcome::Authenticated(session) => {
            let mut nav = Navigator::new(app.guard.clone());
            let landed = nav.navigate(DASHBOARD_ROUTE);
            Ok(format!("Welcome, {}! ({})", session.user.name, landed.route()))
        }
        SubmitOutcome::Failed(message) => Err(CliError::LoginFailed(message)),
        SubmitOutcome::Busy => Err(CliError::Busy),
        SubmitOutcome::Invalid(errors) => {
            Err(CliError::Validation(errors.first().unwrap_or(ValidationError::InvalidEmail)))
        }
    }
}

pub fn logout(app: &App) -> Result<String, CliError> {
    app.session.logout()?;
    Ok("Signed out.".to_owned())
}

/// Pretty JSON of the current user, or a short note when there is none.
pub fn whoami(app: &App) -> Result<String, CliError> {
    match app.session.current_user() {
        Some(user) => Ok(serde_json::to_string_pretty(&user)?),
        None if app.session.is_authenticated() => Ok("signed in (profile unavailable)".to_owned()),
        None => Ok("not signed in".to_owned()),
    }
}

pub fn status(app: &App) -> String {
    let roles = app.session.current_user().map(|user| user.roles.join(",")).unwrap_or_default();
    format!("authenticated: {}\nroles: {roles}", app.session.is_authenticated())
}

pub fn has_role(app: &App, role: &str) -> String {
    app.session.has_role(role).to_string()
}

pub fn visit(app: &App, path: &str) -> String {
    match app.guard.check(path) {
        Navigation::Allow(route) => route,
        Navigation::Redirect { from, to } => format!("{to} (redirected from {from})"),
    }
}

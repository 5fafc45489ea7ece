use clap::Subcommand;
use serde_json::json;

use crate::auth::{self, AuthClient, LoginForm};
use crate::cli::utils::{output_error, output_field_errors, output_success, read_line};
use crate::cli::{open_session, OutputFormat};
use crate::config::AppConfig;
use crate::session::Route;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Log in and store the session tokens")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Clear the stored session tokens")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat, config: &AppConfig) -> anyhow::Result<()> {
    let session = open_session(config)?;

    match cmd {
        AuthCommands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => read_line("Password: ")?,
            };
            let auth = AuthClient::from_config(config)?;
            let mut form = LoginForm::new(username, password);

            match form.submit(&auth, &session).await {
                Route::Login => {
                    if !form.field_errors().is_empty() {
                        output_field_errors(&output_format, form.field_errors())?;
                        anyhow::bail!("login form is incomplete");
                    }
                    let message = form.error_message().unwrap_or_default().to_string();
                    output_error(&output_format, &message, Some("LOGIN_FAILED"))?;
                    anyhow::bail!("login failed: {}", message)
                }
                route => output_success(
                    &output_format,
                    &format!("Logged in as {}", form.username.trim()),
                    Some(json!({ "route": route.path() })),
                ),
            }
        }
        AuthCommands::Logout => {
            let (notice, route) = auth::logout(&session);
            output_success(&output_format, notice, Some(json!({ "route": route.path() })))
        }
        AuthCommands::Status => {
            let authenticated = session.is_authenticated();
            let message = if authenticated { "Authenticated" } else { "Not authenticated" };
            output_success(&output_format, message, Some(json!({ "authenticated": authenticated })))
        }
    }
}

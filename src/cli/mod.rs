pub mod commands;
pub mod utils;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::{self, AppConfig};
use crate::session::{FileSession, Session};

#[derive(Parser)]
#[command(name = "planning")]
#[command(about = "Planning console - sign in and manage planning records")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and token management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "List and edit planning records")]
    Plan {
        #[command(subcommand)]
        cmd: commands::plan::PlanCommands,
    },

    #[command(about = "Show where the session guard sends a path")]
    Route {
        #[arg(help = "Path such as /dashboard or /login")]
        path: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Session persisted under the config directory
pub fn open_session(config: &AppConfig) -> anyhow::Result<Session> {
    let dir = config.config_dir()?;
    Ok(Arc::new(FileSession::new(dir)))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = config::config();

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format, config).await,
        Commands::Plan { cmd } => commands::plan::handle(cmd, output_format, config).await,
        Commands::Route { path } => commands::route::handle(path, output_format, config),
    }
}

//! Diary - command-line access to your character roster.
//!
//! Main entry point for the Diary CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;

mod commands;

use commands::{config, roster, status};

/// Backend URL used when neither flag, env nor config sets one.
const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Diary - browse, follow and sample the characters that react to your posts
#[derive(Parser)]
#[command(name = "diary")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Backend URL (default: [backend] url, then http://localhost:8080)
    #[arg(long, global = true, env = "DIARY_SERVER_URL")]
    pub server: Option<String>,

    /// User whose roster to use (default: [user] id)
    #[arg(long, global = true, env = "DIARY_USER_ID")]
    pub user: Option<String>,

    /// Backend API key (default: [backend] api_key)
    #[arg(long, global = true, env = "DIARY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse and follow characters
    Roster(roster::RosterArgs),

    /// Check that the backend is reachable
    Status(status::StatusArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config commands still run against an unusable file so it can be found.
    let loaded = match &cli.command {
        Commands::Config(_) => diary_config::load_config_lenient(None, None),
        _ => diary_config::load_config(None)?,
    };
    let logging = loaded.config.logging();

    // Initialize tracing: console (human-readable) + rotating JSON file
    let console_filter = if cli.verbose {
        "diary=debug,diary_roster=debug,diary_client=debug,diary_config=debug,info".to_string()
    } else {
        logging
            .level
            .clone()
            .unwrap_or_else(|| "diary=info,diary_roster=info,diary_client=info,warn".to_string())
    };

    let (file_writer, _guard) = if logging.json_file {
        let log_dir = diary_config::user_config_dir()
            .map(|d| d.join("logs"))
            .unwrap_or_else(|| std::path::PathBuf::from("logs"));
        let file_appender = tracing_appender::rolling::daily(&log_dir, "diary.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (Some(non_blocking), Some(guard))
    } else {
        (None, None)
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(console_filter)),
        )
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "diary=trace,diary_roster=trace,diary_client=trace,diary_config=trace,info",
                ))
        }))
        .init();

    for warning in &loaded.warnings {
        warn!("{}", warning);
    }

    let settings = &loaded.config;
    let server_url = cli
        .server
        .or_else(|| settings.backend_url().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    let api_key = cli.api_key.or_else(|| settings.api_key().map(str::to_string));
    let user_id = cli.user.or_else(|| settings.user_id().map(str::to_string));

    // Create context for commands
    let ctx = commands::Context {
        server_url,
        api_key,
        user_id,
        timeout: settings.timeout(),
        roster: settings.roster(),
        json_output: cli.json,
        verbose: cli.verbose,
        loaded: loaded.clone(),
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Roster(args) => roster::run(args, &ctx).await,
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

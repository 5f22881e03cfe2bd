//! Config command - configuration management.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};
use serde::Serialize;

use diary_config::{self, DiaryConfig};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show resolved configuration and where it was loaded from
    Show,

    /// Show the user configuration file path
    Path,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./diary.toml) instead of user config
        #[arg(long)]
        local: bool,
    },
}

/// Resolved configuration for JSON output.
#[derive(Debug, Serialize)]
struct ShowOutput<'a> {
    server_url: &'a str,
    user_id: Option<&'a str>,
    api_key_set: bool,
    timeout_secs: u64,
    stale_after_secs: u64,
    expire_after_secs: u64,
    comment_sample_size: usize,
    sources: Vec<String>,
    warnings: &'a [String],
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Path => cmd_path(),
        ConfigCommand::Init { local } => cmd_init(local),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;

    if ctx.json_output {
        let output = ShowOutput {
            server_url: &ctx.server_url,
            user_id: ctx.user_id.as_deref(),
            api_key_set: ctx.api_key.is_some(),
            timeout_secs: ctx.timeout.as_secs(),
            stale_after_secs: ctx.roster.stale_after_secs,
            expire_after_secs: ctx.roster.expire_after_secs,
            comment_sample_size: ctx.roster.comment_sample_size,
            sources: loaded
                .loaded_from()
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            warnings: &loaded.warnings,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();

    println!("{}", style("Diary Configuration").bold());
    println!("{}", dim.apply_to("─".repeat(50)));
    println!();

    println!("Config files (later overrides earlier):");
    for source in &loaded.sources {
        let status = if source.loaded {
            Style::new().green().apply_to("✓ loaded")
        } else {
            dim.apply_to("· not found")
        };
        println!("  {} {}", status, source.path.display());
    }
    println!();

    println!("Backend:");
    println!("  {} {}", dim.apply_to("url:"), ctx.server_url);
    println!(
        "  {} {}",
        dim.apply_to("api key:"),
        if ctx.api_key.is_some() { "set" } else { "not set" }
    );
    println!("  {} {}s", dim.apply_to("timeout:"), ctx.timeout.as_secs());
    println!();

    println!("Roster:");
    println!(
        "  {} {}",
        dim.apply_to("user:"),
        ctx.user_id.as_deref().unwrap_or("(none)")
    );
    println!("  {} {}s", dim.apply_to("stale after:"), ctx.roster.stale_after_secs);
    println!("  {} {}s", dim.apply_to("expire after:"), ctx.roster.expire_after_secs);
    println!("  {} {}", dim.apply_to("comment sample:"), ctx.roster.comment_sample_size);
    println!();

    if !loaded.warnings.is_empty() {
        let yellow = Style::new().yellow();
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  {} {}", yellow.apply_to("⚠"), w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        println!("{}", loaded.config.to_toml()?);
    }

    Ok(())
}

fn cmd_path() -> Result<()> {
    match diary_config::user_config_path() {
        Some(path) => println!("{}", path.display()),
        None => eprintln!("Could not determine config directory"),
    }
    Ok(())
}

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        diary_config::project_config_path(None)
    } else {
        diary_config::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
    };

    init_at(&path)
}

fn init_at(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    diary_config::save_config(&DiaryConfig::template(), path)?;

    let green = Style::new().green();
    println!("{} Created config file: {}", green.apply_to("✓"), path.display());
    println!();
    println!("Next steps:");
    println!("  set [user] id in the file, or pass --user");
    println!("  export DIARY_API_KEY=...     # keep the key out of the file");
    println!("  diary config show            # verify configuration");

    Ok(())
}

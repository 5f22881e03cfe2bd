//! Status command - checks that the backend is reachable.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;

use super::Context;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Status response for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    reachable: bool,
    status: Option<String>,
    version: Option<String>,
    server_url: String,
}

/// Run the status command.
pub async fn run(_args: StatusArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let result = client.health().check().await;

    if ctx.json_output {
        let output = match &result {
            Ok(health) => StatusOutput {
                reachable: true,
                status: Some(health.status.clone()),
                version: health.version.clone(),
                server_url: ctx.server_url.clone(),
            },
            Err(_) => StatusOutput {
                reachable: false,
                status: None,
                version: None,
                server_url: ctx.server_url.clone(),
            },
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();

    println!();
    println!("{}", style("Diary Backend Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();

    match result {
        Ok(health) => {
            let marker = if health.is_ok() {
                Style::new().green().apply_to(format!("● {}", health.status))
            } else {
                Style::new().yellow().apply_to(format!("● {}", health.status))
            };
            println!("  {} {}", dim.apply_to("Status:"), marker);
            if let Some(version) = &health.version {
                println!("  {} {}", dim.apply_to("Version:"), version);
            }
            println!("  {} {}", dim.apply_to("Server:"), ctx.server_url);
        }
        Err(e) => {
            let red = Style::new().red();
            println!(
                "  {} {}",
                dim.apply_to("Status:"),
                red.apply_to("● unreachable")
            );
            println!("  {} {}", dim.apply_to("Server:"), ctx.server_url);
            if ctx.verbose {
                println!();
                println!("  {} {}", dim.apply_to("Error:"), e);
            }
        }
    }

    println!();
    Ok(())
}

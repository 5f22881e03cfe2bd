//! Roster command - browse and follow characters.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};
use diary_roster::RosterCache;
use diary_types::{Character, CharacterId};
use serde::Serialize;

use super::Context;

/// Arguments for the roster command.
#[derive(Args, Debug)]
pub struct RosterArgs {
    #[command(subcommand)]
    pub command: RosterCommand,
}

#[derive(Subcommand, Debug)]
pub enum RosterCommand {
    /// List every character visible to you
    List,

    /// List the characters you follow
    Followed,

    /// Follow or unfollow a character
    Toggle {
        /// Character ID
        id: String,
    },

    /// Pick random followed characters, as when choosing who reacts to a post
    Sample {
        /// How many to pick (default: [roster] comment_sample_size)
        count: Option<usize>,
    },

    /// Adjust your affinity with a character
    Affinity {
        /// Character ID
        id: String,

        /// Amount to add (may be negative)
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
}

/// Affinity update for JSON output.
#[derive(Debug, Serialize)]
struct AffinityOutput<'a> {
    character_id: &'a str,
    affinity: i64,
}

/// Run the roster command.
pub async fn run(args: RosterArgs, ctx: &Context) -> Result<()> {
    let cache = ctx.roster_cache()?;

    match args.command {
        RosterCommand::List => {
            let characters = load(&cache).await?;
            print_characters(ctx, "Characters", &characters)?;
        }
        RosterCommand::Followed => {
            load(&cache).await?;
            print_characters(ctx, "Followed", &cache.followed())?;
        }
        RosterCommand::Toggle { id } => {
            load(&cache).await?;
            let id = CharacterId::new(id);
            if let Some(character) = cache.toggle_follow(&id).await? {
                if ctx.json_output {
                    println!("{}", serde_json::to_string_pretty(&character)?);
                } else {
                    let green = Style::new().green();
                    let verb = if character.is_following {
                        "Following"
                    } else {
                        "Unfollowed"
                    };
                    println!("{} {} {}", green.apply_to("✓"), verb, style(&character.name).bold());
                }
            }
        }
        RosterCommand::Sample { count } => {
            load(&cache).await?;
            let count = count.unwrap_or(ctx.roster.comment_sample_size);
            print_characters(ctx, "Sample", &cache.random_characters(count))?;
        }
        RosterCommand::Affinity { id, delta } => {
            load(&cache).await?;
            let id = CharacterId::new(id);
            if let Some(affinity) = cache.record_affinity(&id, delta).await? {
                if ctx.json_output {
                    let output = AffinityOutput {
                        character_id: id.as_str(),
                        affinity,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    let dim = Style::new().dim();
                    println!("{} {}", dim.apply_to(format!("[{}]", id)), affinity);
                }
            }
        }
    }

    Ok(())
}

async fn load(cache: &RosterCache) -> Result<Vec<Character>> {
    let roster = cache.load(false).await?;
    Ok(roster.map(|r| r.to_vec()).unwrap_or_default())
}

fn print_characters(ctx: &Context, title: &str, characters: &[Character]) -> Result<()> {
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(characters)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let green = Style::new().green();

    println!("{}", style(title).bold());
    println!("{}", dim.apply_to("─".repeat(50)));
    println!();

    if characters.is_empty() {
        println!("{}", dim.apply_to("No characters found"));
        return Ok(());
    }

    for character in characters {
        let marker = if character.is_following {
            green.apply_to("●").to_string()
        } else {
            dim.apply_to("○").to_string()
        };
        println!(
            "{} {} {} {}",
            marker,
            style(&character.name).bold(),
            dim.apply_to(format!("[{}]", character.id)),
            dim.apply_to(format!("affinity {}", character.affinity))
        );
        if ctx.verbose && !character.description.is_empty() {
            println!("    {}", truncate(&character.description, 60));
        }
    }

    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_chars {
        s
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

//! CLI command handlers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use diary_client::DiaryClient;
use diary_config::{LoadedConfig, RosterSection};
use diary_roster::{RosterCache, RosterConfig, RosterSources};
use diary_types::UserId;

pub mod config;
pub mod roster;
pub mod status;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Backend URL to connect to.
    pub server_url: String,
    /// API key for the backend.
    pub api_key: Option<String>,
    /// Active user.
    pub user_id: Option<String>,
    /// Backend request timeout.
    pub timeout: Duration,
    /// Roster cache settings.
    pub roster: RosterSection,
    /// Merged configuration and where it came from.
    pub loaded: LoadedConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Build a backend client from the resolved settings.
    pub fn client(&self) -> Result<DiaryClient> {
        let mut builder = DiaryClient::builder()
            .base_url(&self.server_url)
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        builder
            .build()
            .with_context(|| format!("invalid backend settings for {}", self.server_url))
    }

    /// Build a roster cache bound to the active user.
    pub fn roster_cache(&self) -> Result<RosterCache> {
        let user = self
            .user_id
            .clone()
            .context("no user selected; pass --user, set DIARY_USER_ID or [user] id")?;

        let config = RosterConfig::new()
            .with_stale_after(self.roster.stale_after())
            .with_expire_after(self.roster.expire_after());
        let sources = RosterSources::from_backend(Arc::new(self.client()?));

        Ok(RosterCache::for_user(config, sources, UserId::new(user)))
    }
}

//! Configuration types.
//!
//! Every section is optional; a missing section means "use the defaults".
//! Within a section, missing fields take their defaults as well.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default backend request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default age after which a cached roster is refreshed in the background.
pub const DEFAULT_STALE_AFTER_SECS: u64 = 30;

/// Default age after which a cached roster is no longer served.
pub const DEFAULT_EXPIRE_AFTER_SECS: u64 = 300;

/// Default number of characters picked to react to a post.
pub const DEFAULT_COMMENT_SAMPLE_SIZE: usize = 3;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiaryConfig {
    /// Backend connection settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendConfig>,

    /// Roster cache settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roster: Option<RosterSection>,

    /// Default identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSection>,

    /// Logging settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl DiaryConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// A config with every section present and set to its defaults.
    pub fn template() -> Self {
        Self {
            backend: Some(BackendConfig {
                url: Some("http://localhost:8080".to_string()),
                ..BackendConfig::default()
            }),
            roster: Some(RosterSection::default()),
            user: Some(UserSection::default()),
            logging: Some(LoggingConfig::default()),
        }
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not field by field.
    pub fn merge(&mut self, other: DiaryConfig) {
        if other.backend.is_some() {
            self.backend = other.backend;
        }

        if other.roster.is_some() {
            self.roster = other.roster;
        }

        if other.user.is_some() {
            self.user = other.user;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Check values that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if let Some(backend) = &self.backend
            && backend.timeout_secs == 0
        {
            return Err(ConfigError::InvalidValue {
                field: "backend.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if let Some(roster) = &self.roster
            && roster.stale_after_secs > roster.expire_after_secs
        {
            return Err(ConfigError::InvalidValue {
                field: "roster.stale_after_secs".to_string(),
                reason: format!(
                    "{} exceeds expire_after_secs ({})",
                    roster.stale_after_secs, roster.expire_after_secs
                ),
            });
        }

        Ok(())
    }

    /// Backend URL, if configured.
    pub fn backend_url(&self) -> Option<&str> {
        self.backend.as_ref().and_then(|b| b.url.as_deref())
    }

    /// Backend API key, if configured.
    pub fn api_key(&self) -> Option<&str> {
        self.backend.as_ref().and_then(|b| b.api_key.as_deref())
    }

    /// Backend request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.backend
                .as_ref()
                .map_or(DEFAULT_TIMEOUT_SECS, |b| b.timeout_secs),
        )
    }

    /// Roster settings, defaulted if the section is absent.
    pub fn roster(&self) -> RosterSection {
        self.roster.clone().unwrap_or_default()
    }

    /// Default user id, if configured.
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.id.as_deref())
    }

    /// Logging settings, defaulted if the section is absent.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Project API key. Prefer `DIARY_API_KEY` over storing it here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl BackendConfig {
    /// Whether the API key is stored in the file itself.
    pub fn has_plaintext_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Roster
// ─────────────────────────────────────────────────────────────────────────────

/// Roster cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterSection {
    /// Age in seconds after which a cached roster is refreshed in the
    /// background.
    pub stale_after_secs: u64,
    /// Age in seconds after which a cached roster is refetched before use.
    pub expire_after_secs: u64,
    /// Number of characters picked to react to a post.
    pub comment_sample_size: usize,
}

impl RosterSection {
    /// Stale window as a duration.
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    /// Expiry window as a duration.
    pub fn expire_after(&self) -> Duration {
        Duration::from_secs(self.expire_after_secs)
    }
}

impl Default for RosterSection {
    fn default() -> Self {
        Self {
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
            expire_after_secs: DEFAULT_EXPIRE_AFTER_SECS,
            comment_sample_size: DEFAULT_COMMENT_SAMPLE_SIZE,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// Default identity used when `--user` is not given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Console filter directive, e.g. `"diary=debug,info"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Write JSON logs to `<config dir>/logs`.
    pub json_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            json_file: true,
        }
    }
}

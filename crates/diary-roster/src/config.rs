//! Configuration for the roster cache.

use std::time::Duration;

use crate::freshness::FreshnessPolicy;

/// Default age after which a cached roster is refreshed in the background.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);

/// Default age after which a cached roster is no longer served.
pub const DEFAULT_EXPIRE_AFTER: Duration = Duration::from_secs(5 * 60);

/// Configuration for the roster cache.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    /// Entries older than this are still served but trigger a silent
    /// background refresh.
    pub stale_after: Duration,

    /// Entries older than this are treated as a cache miss.
    pub expire_after: Duration,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            expire_after: DEFAULT_EXPIRE_AFTER,
        }
    }
}

impl RosterConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the age after which entries refresh in the background.
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Set the age after which entries expire.
    pub fn with_expire_after(mut self, expire_after: Duration) -> Self {
        self.expire_after = expire_after;
        self
    }

    /// Build the freshness policy for these windows.
    ///
    /// A stale window longer than the expiry window is clamped to it.
    pub fn policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(self.stale_after.min(self.expire_after), self.expire_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RosterConfig::default();
        assert_eq!(config.stale_after, Duration::from_secs(30));
        assert_eq!(config.expire_after, Duration::from_secs(300));
    }

    #[test]
    fn test_stale_window_clamped_to_expiry() {
        let policy = RosterConfig::new()
            .with_stale_after(Duration::from_secs(600))
            .with_expire_after(Duration::from_secs(60))
            .policy();
        assert_eq!(policy.stale_after(), Duration::from_secs(60));
        assert_eq!(policy.expire_after(), Duration::from_secs(60));
    }
}

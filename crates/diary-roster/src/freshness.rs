//! Age-based freshness classification of cached rosters.

use std::time::Duration;

use tokio::time::Instant;

/// How usable a cached roster is, based on when it was populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing cached.
    Empty,
    /// Served as-is.
    Fresh,
    /// Served as-is, but a background refresh should be started.
    Stale,
    /// Too old to serve; must be fetched again.
    Expired,
}

impl Freshness {
    /// Whether the cached roster may be returned to a caller.
    pub fn is_valid(self) -> bool {
        matches!(self, Freshness::Fresh | Freshness::Stale)
    }

    /// Whether a background refresh should accompany the cached roster.
    pub fn needs_refresh(self) -> bool {
        self == Freshness::Stale
    }
}

/// Stale and expiry windows for cached rosters.
///
/// An age up to `stale_after` is fresh, up to `expire_after` is stale, and
/// anything older is expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    stale_after: Duration,
    expire_after: Duration,
}

impl FreshnessPolicy {
    /// Create a policy with the given windows.
    pub fn new(stale_after: Duration, expire_after: Duration) -> Self {
        Self {
            stale_after,
            expire_after,
        }
    }

    /// Age after which a background refresh is due.
    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Age after which the entry is no longer served.
    pub fn expire_after(&self) -> Duration {
        self.expire_after
    }

    /// Classify an entry populated at `populated_at` as of now.
    pub fn classify(&self, populated_at: Option<Instant>) -> Freshness {
        self.classify_at(populated_at, Instant::now())
    }

    /// Classify an entry populated at `populated_at` as of `now`.
    pub fn classify_at(&self, populated_at: Option<Instant>, now: Instant) -> Freshness {
        let Some(populated_at) = populated_at else {
            return Freshness::Empty;
        };

        let age = now.saturating_duration_since(populated_at);
        if age > self.expire_after {
            Freshness::Expired
        } else if age > self.stale_after {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }
}

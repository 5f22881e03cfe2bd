//! Character roster cache.
//!
//! This crate keeps the active user's character roster in memory with:
//! - Freshness windows: fresh reads are free, stale reads refresh in the
//!   background, expired reads block on a fetch
//! - Single-flight fetches so concurrent loads share one backend call
//! - Optimistic follow toggles with exact rollback on failure
//! - A `watch` channel publishing the roster and its derived views
//!
//! # Example
//!
//! ```rust,ignore
//! use diary_roster::{RosterCache, RosterConfig, RosterSources};
//!
//! let cache = RosterCache::for_user(
//!     RosterConfig::default(),
//!     RosterSources::from_backend(client),
//!     user_id,
//! );
//!
//! let roster = cache.load(false).await?;
//! cache.toggle_follow(&character_id).await?;
//! let commenters = cache.random_characters(3);
//! ```

use std::sync::Arc;

use diary_types::Character;

mod cache;
mod config;
mod error;
mod freshness;
pub mod mock;
mod mutation;
mod single_flight;
mod view;

pub use cache::{RosterCache, RosterSources, RosterStats};
pub use config::{DEFAULT_EXPIRE_AFTER, DEFAULT_STALE_AFTER, RosterConfig};
pub use error::{Result, RosterError};
pub use freshness::{Freshness, FreshnessPolicy};
pub use mock::MockSource;
pub use mutation::{PendingToggle, ToggleState, apply_outcome, overlay_pending};
pub use single_flight::{FlightHandle, SingleFlight};
pub use view::{RosterSnapshot, RosterView};

/// A user's characters as last seen by the cache.
///
/// Shared immutably; every change produces a new allocation.
pub type Roster = Arc<Vec<Character>>;

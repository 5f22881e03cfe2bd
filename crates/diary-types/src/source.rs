//! Collaborator traits consumed by the roster cache.
//!
//! Implemented by the HTTP client and by the roster crate's in-memory mock.

use std::sync::Arc;

use async_trait::async_trait;

use crate::character::{Character, FollowOutcome};
use crate::error::SourceError;
use crate::ids::{CharacterId, UserId};

/// Fetches the full roster of characters visible to a user.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Return every character (system-provided and user-created) together
    /// with the user's follow and affinity state, in display order.
    async fn fetch_roster(&self, user_id: &UserId) -> Result<Vec<Character>, SourceError>;
}

/// Flips a user's follow relationship to a character.
#[async_trait]
pub trait FollowToggleSource: Send + Sync {
    /// Toggle the follow state and return the authoritative result.
    async fn toggle_follow(
        &self,
        user_id: &UserId,
        character_id: &CharacterId,
    ) -> Result<FollowOutcome, SourceError>;
}

/// Adjusts the affinity counter between a user and a character.
#[async_trait]
pub trait AffinitySource: Send + Sync {
    /// Add `delta` to the affinity counter and return the new value.
    async fn update_affinity(
        &self,
        user_id: &UserId,
        character_id: &CharacterId,
        delta: i64,
    ) -> Result<i64, SourceError>;
}

/// Shared roster source.
pub type SharedRosterSource = Arc<dyn RosterSource>;

/// Shared follow toggle source.
pub type SharedFollowToggleSource = Arc<dyn FollowToggleSource>;

/// Shared affinity source.
pub type SharedAffinitySource = Arc<dyn AffinitySource>;

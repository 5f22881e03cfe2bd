//! Error types for roster cache operations.

use diary_types::{CharacterId, SourceError};

/// Error type for roster cache operations.
///
/// Cloneable so a single fetch result can be handed to every caller that
/// joined the same in-flight request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RosterError {
    /// The roster source failed.
    #[error("Failed to load characters: {0}")]
    Fetch(SourceError),

    /// The follow toggle source failed. Local state was rolled back.
    #[error("Failed to update follow state: {0}")]
    Toggle(SourceError),

    /// The affinity source failed.
    #[error("Failed to update affinity: {0}")]
    Affinity(SourceError),

    /// The character is not part of the cached roster.
    #[error("Character not found in roster: {0}")]
    UnknownCharacter(CharacterId),

    /// The in-flight request ended without producing a result.
    #[error("Roster request ended without a result")]
    Abandoned,
}

/// Result type for roster cache operations.
pub type Result<T> = std::result::Result<T, RosterError>;

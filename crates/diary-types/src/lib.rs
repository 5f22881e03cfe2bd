//! Shared types for the Diary character roster.
//!
//! The roster cache, the backend client and the CLI all speak in terms of
//! these types. The backend collaborator traits the cache consumes live
//! here as well.

pub mod character;
pub mod error;
pub mod ids;
pub mod source;

pub use character::{Character, FollowOutcome};
pub use error::SourceError;
pub use ids::{CharacterId, RelationId, UserId};
pub use source::{
    AffinitySource, FollowToggleSource, RosterSource, SharedAffinitySource,
    SharedFollowToggleSource, SharedRosterSource,
};

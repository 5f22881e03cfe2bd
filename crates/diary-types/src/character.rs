//! Character (persona) types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, RelationId, UserId};

/// A selectable AI persona together with the current user's relationship
/// to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Backend-assigned identifier.
    pub id: CharacterId,

    /// Display name.
    pub name: String,

    /// Short description shown to the user.
    #[serde(default)]
    pub description: String,

    /// Persona description handed to the comment generator.
    #[serde(default, alias = "promptDescription")]
    pub prompt_description: String,

    /// Avatar image URL.
    #[serde(default, alias = "avatarUrl", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Creator of the character; `None` for system-provided characters.
    #[serde(default, alias = "ownerId", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,

    /// Whether the current user follows this character.
    #[serde(default, alias = "isFollowing")]
    pub is_following: bool,

    /// Interaction strength between the current user and this character.
    #[serde(default)]
    pub affinity: i64,

    /// Per-user relationship row, if one has been created.
    #[serde(default, alias = "userCharacterRelationId")]
    pub user_character_relation_id: Option<RelationId>,

    /// When the character was created.
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Character {
    /// Create a character with the given id and name and no relationship.
    pub fn new(id: impl Into<CharacterId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            prompt_description: String::new(),
            avatar_url: None,
            owner_id: None,
            is_following: false,
            affinity: 0,
            user_character_relation_id: None,
            created_at: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the prompt description.
    pub fn with_prompt_description(mut self, prompt: impl Into<String>) -> Self {
        self.prompt_description = prompt.into();
        self
    }

    /// Set the follow state.
    pub fn with_following(mut self, following: bool) -> Self {
        self.is_following = following;
        self
    }

    /// Set the relationship id.
    pub fn with_relation(mut self, relation: impl Into<RelationId>) -> Self {
        self.user_character_relation_id = Some(relation.into());
        self
    }

    /// Set the owner (marks the character as user-created).
    pub fn with_owner(mut self, owner: impl Into<UserId>) -> Self {
        self.owner_id = Some(owner.into());
        self
    }

    /// Whether the character is provided by the system rather than a user.
    pub fn is_system(&self) -> bool {
        self.owner_id.is_none()
    }
}

/// Authoritative follow state returned by the backend after a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowOutcome {
    /// Relationship row id (created on first follow).
    #[serde(alias = "relationId")]
    pub relation_id: RelationId,

    /// Follow state after the toggle.
    #[serde(alias = "isFollowing")]
    pub is_following: bool,
}

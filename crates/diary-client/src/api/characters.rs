//! Characters API.

use diary_types::{Character, CharacterId, FollowOutcome, UserId};

use crate::client::DiaryClient;
use crate::error::Result;
use crate::types::{AffinityRequest, AffinityResponse};

/// Per-user character endpoints.
pub struct CharactersApi {
    client: DiaryClient,
}

impl CharactersApi {
    pub(crate) fn new(client: DiaryClient) -> Self {
        Self { client }
    }

    /// List every character visible to a user, with their follow state.
    pub async fn roster(&self, user_id: &UserId) -> Result<Vec<Character>> {
        self.client
            .get(&["users", user_id.as_str(), "characters"])
            .await
    }

    /// Flip the user's follow relationship with a character.
    pub async fn toggle_follow(
        &self,
        user_id: &UserId,
        character_id: &CharacterId,
    ) -> Result<FollowOutcome> {
        self.client
            .post_empty(&[
                "users",
                user_id.as_str(),
                "characters",
                character_id.as_str(),
                "follow",
            ])
            .await
    }

    /// Add `delta` to the user's affinity with a character.
    ///
    /// Returns the updated affinity.
    pub async fn update_affinity(
        &self,
        user_id: &UserId,
        character_id: &CharacterId,
        delta: i64,
    ) -> Result<i64> {
        let response: AffinityResponse = self
            .client
            .post(
                &[
                    "users",
                    user_id.as_str(),
                    "characters",
                    character_id.as_str(),
                    "affinity",
                ],
                &AffinityRequest { delta },
            )
            .await?;
        Ok(response.affinity)
    }
}

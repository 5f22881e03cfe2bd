//! Roster collaborator traits backed by the HTTP client.

use async_trait::async_trait;
use diary_types::{
    AffinitySource, Character, CharacterId, FollowOutcome, FollowToggleSource, RosterSource,
    SourceError, UserId,
};

use crate::client::DiaryClient;

#[async_trait]
impl RosterSource for DiaryClient {
    async fn fetch_roster(&self, user_id: &UserId) -> Result<Vec<Character>, SourceError> {
        Ok(self.characters().roster(user_id).await?)
    }
}

#[async_trait]
impl FollowToggleSource for DiaryClient {
    async fn toggle_follow(
        &self,
        user_id: &UserId,
        character_id: &CharacterId,
    ) -> Result<FollowOutcome, SourceError> {
        Ok(self.characters().toggle_follow(user_id, character_id).await?)
    }
}

#[async_trait]
impl AffinitySource for DiaryClient {
    async fn update_affinity(
        &self,
        user_id: &UserId,
        character_id: &CharacterId,
        delta: i64,
    ) -> Result<i64, SourceError> {
        Ok(self
            .characters()
            .update_affinity(user_id, character_id, delta)
            .await?)
    }
}

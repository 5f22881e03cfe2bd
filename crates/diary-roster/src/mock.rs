//! In-memory backend for driving the roster cache in tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use diary_types::{
    AffinitySource, Character, CharacterId, FollowOutcome, FollowToggleSource, RelationId,
    RosterSource, SourceError, UserId,
};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

/// A call that can be held open until the test releases it.
#[derive(Default)]
struct Gate {
    semaphore: Mutex<Option<Arc<Semaphore>>>,
}

impl Gate {
    fn hold(&self) {
        *self.semaphore.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    fn release(&self) {
        if let Some(semaphore) = self.semaphore.lock().take() {
            semaphore.close();
        }
    }

    async fn pass(&self) {
        let semaphore = self.semaphore.lock().clone();
        if let Some(semaphore) = semaphore {
            // Closing the semaphore is the release signal.
            let _ = semaphore.acquire().await;
        }
    }
}

/// A mock backend implementing every roster collaborator.
///
/// Fetches return the current roster; toggles flip the mock's own copy and
/// answer with `rel-<character id>` unless a response has been scripted.
/// Fetches and toggles can be held open to observe in-flight behaviour.
#[derive(Default)]
pub struct MockSource {
    roster: Mutex<Vec<Character>>,
    fetch_failures: Mutex<VecDeque<SourceError>>,
    toggle_responses: Mutex<VecDeque<Result<FollowOutcome, SourceError>>>,
    toggle_failures: Mutex<HashMap<CharacterId, SourceError>>,
    fetch_log: Mutex<Vec<UserId>>,
    toggle_log: Mutex<Vec<(UserId, CharacterId)>>,
    affinity_log: Mutex<Vec<(UserId, CharacterId, i64)>>,
    fetch_gate: Gate,
    toggle_gate: Gate,
}

impl MockSource {
    /// Create a mock serving `roster`.
    pub fn new(roster: Vec<Character>) -> Self {
        Self {
            roster: Mutex::new(roster),
            ..Default::default()
        }
    }

    /// Replace the roster served by subsequent fetches.
    pub fn set_roster(&self, roster: Vec<Character>) {
        *self.roster.lock() = roster;
    }

    /// The roster the mock currently holds.
    pub fn roster(&self) -> Vec<Character> {
        self.roster.lock().clone()
    }

    /// Make the next fetch fail with `message`.
    pub fn fail_next_fetch(&self, message: impl Into<String>) {
        self.fetch_failures
            .lock()
            .push_back(SourceError::new(message));
    }

    /// Script the response of the next toggle.
    pub fn push_toggle_response(&self, response: Result<FollowOutcome, SourceError>) {
        self.toggle_responses.lock().push_back(response);
    }

    /// Make every toggle of `character_id` fail with `message`.
    pub fn fail_toggles_of(&self, character_id: impl Into<CharacterId>, message: impl Into<String>) {
        self.toggle_failures
            .lock()
            .insert(character_id.into(), SourceError::new(message));
    }

    /// Hold fetches open until [`release_fetches`](Self::release_fetches).
    pub fn hold_fetches(&self) {
        self.fetch_gate.hold();
    }

    /// Let held fetches complete.
    pub fn release_fetches(&self) {
        self.fetch_gate.release();
    }

    /// Hold toggles open until [`release_toggles`](Self::release_toggles).
    pub fn hold_toggles(&self) {
        self.toggle_gate.hold();
    }

    /// Let held toggles complete.
    pub fn release_toggles(&self) {
        self.toggle_gate.release();
    }

    /// Number of roster fetches started.
    pub fn fetch_count(&self) -> usize {
        self.fetch_log.lock().len()
    }

    /// Users whose rosters were fetched, in call order.
    pub fn fetched_users(&self) -> Vec<UserId> {
        self.fetch_log.lock().clone()
    }

    /// Number of follow toggles started.
    pub fn toggle_count(&self) -> usize {
        self.toggle_log.lock().len()
    }

    /// Affinity updates received, in call order.
    pub fn affinity_updates(&self) -> Vec<(UserId, CharacterId, i64)> {
        self.affinity_log.lock().clone()
    }
}

#[async_trait]
impl RosterSource for MockSource {
    async fn fetch_roster(&self, user_id: &UserId) -> Result<Vec<Character>, SourceError> {
        self.fetch_log.lock().push(user_id.clone());
        self.fetch_gate.pass().await;

        if let Some(err) = self.fetch_failures.lock().pop_front() {
            return Err(err);
        }
        Ok(self.roster.lock().clone())
    }
}

#[async_trait]
impl FollowToggleSource for MockSource {
    async fn toggle_follow(
        &self,
        user_id: &UserId,
        character_id: &CharacterId,
    ) -> Result<FollowOutcome, SourceError> {
        self.toggle_log
            .lock()
            .push((user_id.clone(), character_id.clone()));
        self.toggle_gate.pass().await;

        if let Some(err) = self.toggle_failures.lock().get(character_id).cloned() {
            return Err(err);
        }
        let scripted = self.toggle_responses.lock().pop_front();
        let outcome = match scripted {
            Some(Err(err)) => return Err(err),
            Some(Ok(outcome)) => outcome,
            None => {
                let roster = self.roster.lock();
                let character = roster
                    .iter()
                    .find(|c| &c.id == character_id)
                    .ok_or_else(|| SourceError::new(format!("unknown character {}", character_id)))?;
                FollowOutcome {
                    relation_id: RelationId::new(format!("rel-{}", character_id)),
                    is_following: !character.is_following,
                }
            }
        };

        let mut roster = self.roster.lock();
        if let Some(character) = roster.iter_mut().find(|c| &c.id == character_id) {
            character.is_following = outcome.is_following;
            character.user_character_relation_id = Some(outcome.relation_id.clone());
        }
        Ok(outcome)
    }
}

#[async_trait]
impl AffinitySource for MockSource {
    async fn update_affinity(
        &self,
        user_id: &UserId,
        character_id: &CharacterId,
        delta: i64,
    ) -> Result<i64, SourceError> {
        self.affinity_log
            .lock()
            .push((user_id.clone(), character_id.clone(), delta));

        let mut roster = self.roster.lock();
        let character = roster
            .iter_mut()
            .find(|c| &c.id == character_id)
            .ok_or_else(|| SourceError::new(format!("unknown character {}", character_id)))?;
        character.affinity += delta;
        Ok(character.affinity)
    }
}

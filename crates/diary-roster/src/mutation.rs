//! Optimistic follow toggles.
//!
//! A toggle moves through `Pending -> {Confirmed | RolledBack}`.
//! [`PendingToggle`] is the `Pending` phase: it owns the roster as it was
//! before the flip, so rolling back is just handing that snapshot back.

use std::collections::HashMap;
use std::sync::Arc;

use diary_types::{Character, CharacterId, FollowOutcome, RelationId};

use crate::Roster;

/// Phase of an optimistic follow toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    /// Applied locally, waiting for the backend.
    Pending,
    /// Backend confirmed; local state reconciled.
    Confirmed,
    /// Backend rejected; pre-toggle roster restored.
    RolledBack,
}

impl std::fmt::Display for ToggleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ToggleState::Pending => "pending",
            ToggleState::Confirmed => "confirmed",
            ToggleState::RolledBack => "rolled_back",
        };
        f.write_str(name)
    }
}

/// A follow toggle that has been applied locally but not yet confirmed.
#[derive(Debug)]
pub struct PendingToggle {
    character_id: CharacterId,
    snapshot: Roster,
    following: bool,
}

impl PendingToggle {
    /// Flip `character_id` in `roster`.
    ///
    /// Returns the pending toggle together with the optimistic roster, or
    /// `None` if the character is not in the roster.
    pub fn begin(roster: &Roster, character_id: &CharacterId) -> Option<(Self, Roster)> {
        let index = roster.iter().position(|c| &c.id == character_id)?;

        let mut next = roster.to_vec();
        let following = !next[index].is_following;
        set_following(&mut next[index], following);

        let pending = Self {
            character_id: character_id.clone(),
            snapshot: Arc::clone(roster),
            following,
        };
        Some((pending, Arc::new(next)))
    }

    /// The character being toggled.
    pub fn character_id(&self) -> &CharacterId {
        &self.character_id
    }

    /// The follow state shown to consumers while pending.
    pub fn optimistic_following(&self) -> bool {
        self.following
    }

    /// The roster as it was before the toggle.
    pub fn snapshot(&self) -> &Roster {
        &self.snapshot
    }

    /// Reconcile `current` with the backend's answer.
    ///
    /// `current` is whatever roster is visible when the backend answers,
    /// which may differ from the optimistic one if a refresh landed in
    /// between. Returns the reconciled roster and the confirmed character,
    /// if it is still present.
    pub fn confirm(self, current: &Roster, outcome: &FollowOutcome) -> (Roster, Option<Character>) {
        apply_outcome(current, &self.character_id, outcome)
    }

    /// Give back the pre-toggle roster, untouched.
    pub fn roll_back(self) -> Roster {
        self.snapshot
    }

    /// Restore this character's follow state from the snapshot into
    /// `current`, keeping every other change made since the toggle began.
    pub fn roll_back_onto(self, current: &Roster) -> Roster {
        let before = self.snapshot.iter().find(|c| c.id == self.character_id);
        let index = current.iter().position(|c| c.id == self.character_id);
        let (Some(before), Some(index)) = (before, index) else {
            return Arc::clone(current);
        };

        let mut next = current.to_vec();
        next[index].is_following = before.is_following;
        next[index].user_character_relation_id = before.user_character_relation_id.clone();
        Arc::new(next)
    }
}

/// Write an authoritative follow outcome into a roster.
pub fn apply_outcome(
    roster: &Roster,
    character_id: &CharacterId,
    outcome: &FollowOutcome,
) -> (Roster, Option<Character>) {
    let Some(index) = roster.iter().position(|c| &c.id == character_id) else {
        return (Arc::clone(roster), None);
    };

    let mut next = roster.to_vec();
    let entity = &mut next[index];
    entity.is_following = outcome.is_following;
    entity.user_character_relation_id = Some(outcome.relation_id.clone());
    let confirmed = entity.clone();

    (Arc::new(next), Some(confirmed))
}

/// Re-apply unconfirmed follow states on top of a freshly fetched roster.
///
/// Returns the input unchanged (same allocation) when nothing differs.
pub fn overlay_pending(roster: &Roster, pending: &HashMap<CharacterId, bool>) -> Roster {
    let differs = roster
        .iter()
        .any(|c| pending.get(&c.id).is_some_and(|&f| f != c.is_following));
    if !differs {
        return Arc::clone(roster);
    }

    let mut next = roster.to_vec();
    for entity in &mut next {
        if let Some(&following) = pending.get(&entity.id) {
            set_following(entity, following);
        }
    }
    Arc::new(next)
}

fn set_following(entity: &mut Character, following: bool) {
    entity.is_following = following;
    if entity.user_character_relation_id.is_none() {
        entity.user_character_relation_id = Some(RelationId::temporary());
    }
}

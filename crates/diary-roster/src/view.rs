//! Derived views over the roster and the snapshot published to consumers.

use std::collections::HashSet;
use std::sync::Arc;

use diary_types::{Character, CharacterId};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::Roster;

/// Subsets of a roster that consumers query often.
///
/// Recomputed from scratch whenever the roster changes; holds no state of
/// its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterView {
    followed: Vec<Character>,
    available: Vec<Character>,
    followed_ids: HashSet<CharacterId>,
}

impl RosterView {
    /// Compute the views for `roster`.
    pub fn from_roster(roster: &[Character]) -> Self {
        let followed: Vec<Character> = roster.iter().filter(|c| c.is_following).cloned().collect();
        let followed_ids = followed.iter().map(|c| c.id.clone()).collect();
        // Available is the followed subset for now.
        let available = followed.clone();

        Self {
            followed,
            available,
            followed_ids,
        }
    }

    /// Characters the user follows, in roster order.
    pub fn followed(&self) -> &[Character] {
        &self.followed
    }

    /// Characters eligible to comment on or like a post.
    pub fn available(&self) -> &[Character] {
        &self.available
    }

    /// Ids of followed characters.
    pub fn followed_ids(&self) -> &HashSet<CharacterId> {
        &self.followed_ids
    }

    /// Whether the user follows `id`.
    pub fn is_followed(&self, id: &CharacterId) -> bool {
        self.followed_ids.contains(id)
    }

    /// Pick up to `count` available characters uniformly at random.
    ///
    /// Asking for more than are available returns all of them.
    pub fn random_characters(&self, count: usize) -> Vec<Character> {
        self.random_characters_with(count, &mut rand::rng())
    }

    /// Like [`random_characters`](Self::random_characters) with a caller-supplied RNG.
    pub fn random_characters_with<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Character> {
        let mut pool = self.available.clone();
        pool.shuffle(rng);
        pool.truncate(count);
        pool
    }
}

/// Everything a consumer renders from the cache.
#[derive(Debug, Clone, Default)]
pub struct RosterSnapshot {
    /// Last roster shown to the user, kept while refreshes are in flight.
    pub roster: Option<Roster>,

    /// Derived subsets of `roster`.
    pub view: Arc<RosterView>,

    /// Whether a foreground fetch is in flight.
    pub loading: bool,

    /// Message of the last failed foreground fetch.
    pub last_error: Option<String>,
}

impl RosterSnapshot {
    /// Characters in the roster, or an empty slice if nothing is loaded.
    pub fn characters(&self) -> &[Character] {
        self.roster.as_deref().map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn roster() -> Vec<Character> {
        vec![
            Character::new("a", "Aki"),
            Character::new("b", "Bo").with_following(true),
            Character::new("c", "Cy").with_following(true),
            Character::new("d", "Di").with_following(true),
        ]
    }

    #[test]
    fn test_followed_subset_and_ids() {
        let view = RosterView::from_roster(&roster());

        let names: Vec<_> = view.followed().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Bo", "Cy", "Di"]);
        assert_eq!(view.available(), view.followed());
        assert!(view.is_followed(&"b".into()));
        assert!(!view.is_followed(&"a".into()));
        assert_eq!(view.followed_ids().len(), 3);
    }

    #[test]
    fn test_random_sample_size() {
        let view = RosterView::from_roster(&roster());
        let mut rng = StdRng::seed_from_u64(7);

        let sample = view.random_characters_with(2, &mut rng);
        assert_eq!(sample.len(), 2);
        assert!(sample.iter().all(|c| c.is_following));
        assert_ne!(sample[0].id, sample[1].id);
    }

    #[test]
    fn test_random_sample_larger_than_available() {
        let view = RosterView::from_roster(&roster());

        let sample = view.random_characters(10);
        assert_eq!(sample.len(), 3);

        let ids: HashSet<_> = sample.iter().map(|c| c.id.clone()).collect();
        assert_eq!(&ids, view.followed_ids());
    }

    #[test]
    fn test_random_sample_empty() {
        let view = RosterView::from_roster(&[Character::new("a", "Aki")]);
        assert!(view.random_characters(3).is_empty());
        assert!(view.random_characters(0).is_empty());
    }

    #[test]
    fn test_snapshot_characters_default() {
        let snapshot = RosterSnapshot::default();
        assert!(snapshot.characters().is_empty());
        assert!(!snapshot.loading);
    }
}

//! Session-local cache of a user's character roster.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use diary_types::{
    AffinitySource, Character, CharacterId, FollowToggleSource, RosterSource,
    SharedAffinitySource, SharedFollowToggleSource, SharedRosterSource, UserId,
};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::Roster;
use crate::config::RosterConfig;
use crate::error::{Result, RosterError};
use crate::freshness::{Freshness, FreshnessPolicy};
use crate::mutation::{PendingToggle, ToggleState, overlay_pending};
use crate::single_flight::{FlightHandle, SingleFlight};
use crate::view::{RosterSnapshot, RosterView};

/// The backend calls the cache depends on.
#[derive(Clone)]
pub struct RosterSources {
    /// Fetches the full roster.
    pub roster: SharedRosterSource,
    /// Flips follow relationships.
    pub follow: SharedFollowToggleSource,
    /// Adjusts affinity counters.
    pub affinity: SharedAffinitySource,
}

impl RosterSources {
    /// Bundle individual sources.
    pub fn new(
        roster: SharedRosterSource,
        follow: SharedFollowToggleSource,
        affinity: SharedAffinitySource,
    ) -> Self {
        Self {
            roster,
            follow,
            affinity,
        }
    }

    /// Use one backend for every call.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: RosterSource + FollowToggleSource + AffinitySource + 'static,
    {
        Self {
            roster: backend.clone(),
            follow: backend.clone(),
            affinity: backend,
        }
    }
}

/// Last successful population of the roster.
///
/// Data and timestamp live in one value so one can never be set without
/// the other.
#[derive(Debug, Clone)]
struct Populated {
    data: Roster,
    at: Instant,
}

/// The cached roster for the active user.
#[derive(Debug, Clone, Default)]
struct CacheEntry {
    populated: Option<Populated>,
}

impl CacheEntry {
    fn populate(&mut self, data: Roster) {
        self.populated = Some(Populated {
            data,
            at: Instant::now(),
        });
    }

    fn populated_at(&self) -> Option<Instant> {
        self.populated.as_ref().map(|p| p.at)
    }

    fn clear(&mut self) {
        self.populated = None;
    }
}

/// An unconfirmed follow value, tagged with the toggle that set it.
#[derive(Debug, Clone, Copy)]
struct PendingFollow {
    token: u64,
    following: bool,
}

/// Mutable cache state. Never held across an `.await`.
#[derive(Debug, Default)]
struct CacheState {
    user: Option<UserId>,

    /// Bumped on every user change; results carrying an older epoch are
    /// dropped instead of stored.
    epoch: u64,

    entry: CacheEntry,

    /// Roster shown to consumers, including optimistic changes.
    visible: Option<Roster>,
    view: Arc<RosterView>,

    pending: HashMap<CharacterId, PendingFollow>,
    next_token: u64,

    foreground_fetches: usize,
    last_error: Option<String>,
}

impl CacheState {
    fn set_visible(&mut self, roster: Option<Roster>) {
        self.view = Arc::new(
            roster
                .as_deref()
                .map(|r| RosterView::from_roster(r))
                .unwrap_or_default(),
        );
        self.visible = roster;
    }

    fn pending_values(&self) -> HashMap<CharacterId, bool> {
        self.pending
            .iter()
            .map(|(id, p)| (id.clone(), p.following))
            .collect()
    }

    fn mark_pending(&mut self, character_id: CharacterId, following: bool) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        self.pending
            .insert(character_id, PendingFollow { token, following });
        token
    }

    fn clear_pending(&mut self, character_id: &CharacterId, token: u64) {
        if self
            .pending
            .get(character_id)
            .is_some_and(|p| p.token == token)
        {
            self.pending.remove(character_id);
        }
    }

    fn reset(&mut self, user: Option<UserId>) {
        let epoch = self.epoch + 1;
        let next_token = self.next_token;
        *self = Self {
            user,
            epoch,
            next_token,
            ..Self::default()
        };
    }

    fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            roster: self.visible.clone(),
            view: Arc::clone(&self.view),
            loading: self.foreground_fetches > 0,
            last_error: self.last_error.clone(),
        }
    }
}

struct CacheInner {
    state: Mutex<CacheState>,
    flights: SingleFlight<UserId, Roster, RosterError>,
    sources: RosterSources,
    policy: FreshnessPolicy,
    snapshots: watch::Sender<RosterSnapshot>,
}

/// Session-local cache of the active user's character roster.
///
/// This cache provides:
/// - Fresh reads served from memory, with a silent background refresh once
///   the entry goes stale and a blocking fetch once it expires
/// - At most one roster fetch in flight per user, shared by all callers
/// - Optimistic follow toggles that roll back verbatim on failure
/// - A `watch` channel publishing the roster and its derived views
///
/// Cloning is cheap and every clone shares the same state. All methods that
/// start work spawn onto the tokio runtime, so the cache must be used from
/// within one.
#[derive(Clone)]
pub struct RosterCache {
    inner: Arc<CacheInner>,
}

impl RosterCache {
    /// Create an empty cache with no active user.
    pub fn new(config: RosterConfig, sources: RosterSources) -> Self {
        let (snapshots, _) = watch::channel(RosterSnapshot::default());
        Self {
            inner: Arc::new(CacheInner {
                state: Mutex::new(CacheState::default()),
                flights: SingleFlight::new(),
                sources,
                policy: config.policy(),
                snapshots,
            }),
        }
    }

    /// Create a cache for `user`.
    pub fn for_user(config: RosterConfig, sources: RosterSources, user: UserId) -> Self {
        let cache = Self::new(config, sources);
        cache.set_user(Some(user));
        cache
    }

    /// The freshness windows in use.
    pub fn policy(&self) -> FreshnessPolicy {
        self.inner.policy
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    /// The active user, if any.
    pub fn current_user(&self) -> Option<UserId> {
        self.inner.state.lock().user.clone()
    }

    /// Switch the active user.
    ///
    /// Switching to a different identity discards everything cached for the
    /// previous one. In-flight requests for the previous user still finish
    /// but their results are not stored.
    pub fn set_user(&self, user: Option<UserId>) {
        let mut state = self.inner.state.lock();
        if state.user == user {
            return;
        }

        if let Some(previous) = &state.user {
            self.inner.flights.forget(previous);
        }
        info!(
            previous = ?state.user.as_ref().map(UserId::as_str),
            current = ?user.as_ref().map(UserId::as_str),
            "Active user changed, discarding roster cache"
        );

        state.reset(user);
        self.publish(&state);
    }

    /// Drop the cached entry so the next [`load`](Self::load) fetches.
    ///
    /// The visible roster stays until the fetch replaces it.
    pub fn invalidate(&self) {
        let mut state = self.inner.state.lock();
        state.entry.clear();
        debug!("Roster cache invalidated");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Load the roster for the active user.
    ///
    /// Returns `Ok(None)` when there is no active user. Unless
    /// `force_refresh` is set, a valid cached roster is returned without
    /// waiting; a stale one additionally starts a background refresh. A
    /// missing or expired roster is fetched, joining any fetch already in
    /// flight.
    pub async fn load(&self, force_refresh: bool) -> Result<Option<Roster>> {
        let (user, freshness, cached) = {
            let state = self.inner.state.lock();
            let Some(user) = state.user.clone() else {
                debug!("No active user, skipping roster load");
                return Ok(None);
            };
            let freshness = self.inner.policy.classify(state.entry.populated_at());
            (user, freshness, state.visible.clone())
        };

        if !force_refresh
            && freshness.is_valid()
            && let Some(roster) = cached
        {
            if freshness.needs_refresh() {
                self.refresh_in_background(user);
            } else {
                trace!(user_id = %user, "Roster served from cache");
            }
            return Ok(Some(roster));
        }

        debug!(user_id = %user, ?freshness, force_refresh, "Roster cache miss");
        self.fetch(user).await.map(Some)
    }

    /// Current roster and derived views.
    pub fn snapshot(&self) -> RosterSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Subscribe to roster changes.
    pub fn subscribe(&self) -> watch::Receiver<RosterSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// The visible roster, if loaded.
    pub fn roster(&self) -> Option<Roster> {
        self.inner.state.lock().visible.clone()
    }

    /// Characters the user follows.
    pub fn followed(&self) -> Vec<Character> {
        self.view().followed().to_vec()
    }

    /// Whether the user follows `id`.
    pub fn is_followed(&self, id: &CharacterId) -> bool {
        self.view().is_followed(id)
    }

    /// Pick up to `count` available characters at random, e.g. to decide
    /// which personas react to a new post.
    pub fn random_characters(&self, count: usize) -> Vec<Character> {
        self.view().random_characters(count)
    }

    /// Whether a foreground fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().foreground_fetches > 0
    }

    /// Message of the last failed foreground fetch.
    pub fn last_error(&self) -> Option<String> {
        self.inner.state.lock().last_error.clone()
    }

    /// Freshness of the cached entry right now.
    pub fn freshness(&self) -> Freshness {
        let state = self.inner.state.lock();
        self.inner.policy.classify(state.entry.populated_at())
    }

    /// Cache statistics.
    pub fn stats(&self) -> RosterStats {
        let state = self.inner.state.lock();
        let populated_at = state.entry.populated_at();
        RosterStats {
            characters: state.visible.as_ref().map_or(0, |r| r.len()),
            followed: state.view.followed().len(),
            age: populated_at.map(|at| at.elapsed()),
            freshness: self.inner.policy.classify(populated_at),
            fetch_in_flight: state
                .user
                .as_ref()
                .is_some_and(|u| self.inner.flights.is_in_flight(u)),
            pending_toggles: state.pending.len(),
        }
    }

    fn view(&self) -> Arc<RosterView> {
        Arc::clone(&self.inner.state.lock().view)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Follow or unfollow a character.
    ///
    /// The flip is visible immediately. When the backend confirms, its
    /// answer is written into the roster and the cache entry. When it fails,
    /// the roster from before the call is restored, a forced reload is
    /// attempted, and the original error is returned. If other changes
    /// landed on top of the flip in the meantime, only this character's
    /// follow state is restored.
    ///
    /// Returns `Ok(None)` when there is no active user.
    pub async fn toggle_follow(&self, character_id: &CharacterId) -> Result<Option<Character>> {
        let (user, epoch, pending, token, optimistic) = {
            let mut state = self.inner.state.lock();
            let Some(user) = state.user.clone() else {
                debug!("No active user, ignoring follow toggle");
                return Ok(None);
            };
            let begun = state
                .visible
                .as_ref()
                .and_then(|roster| PendingToggle::begin(roster, character_id));
            let Some((pending, optimistic)) = begun else {
                return Err(RosterError::UnknownCharacter(character_id.clone()));
            };

            let token = state.mark_pending(character_id.clone(), pending.optimistic_following());
            state.set_visible(Some(Arc::clone(&optimistic)));
            self.publish(&state);
            (user, state.epoch, pending, token, optimistic)
        };

        debug!(
            user_id = %user,
            character_id = %character_id,
            following = pending.optimistic_following(),
            state = %ToggleState::Pending,
            "Applied optimistic follow toggle"
        );

        let result = self
            .inner
            .sources
            .follow
            .toggle_follow(&user, character_id)
            .await;

        match result {
            Ok(outcome) => {
                let mut state = self.inner.state.lock();
                state.clear_pending(character_id, token);

                if state.epoch != epoch {
                    debug!(character_id = %character_id, "Follow confirmed after user change, not stored");
                    let snapshot = Arc::clone(pending.snapshot());
                    let (_, confirmed) = pending.confirm(&snapshot, &outcome);
                    return Ok(confirmed);
                }

                let current = state
                    .visible
                    .clone()
                    .unwrap_or_else(|| Arc::clone(pending.snapshot()));
                let (reconciled, confirmed) = pending.confirm(&current, &outcome);
                state.entry.populate(Arc::clone(&reconciled));
                state.set_visible(Some(reconciled));
                self.publish(&state);

                debug!(
                    character_id = %character_id,
                    following = outcome.is_following,
                    relation_id = %outcome.relation_id,
                    state = %ToggleState::Confirmed,
                    "Follow toggle confirmed"
                );
                Ok(confirmed)
            }
            Err(source_error) => {
                {
                    let mut state = self.inner.state.lock();
                    state.clear_pending(character_id, token);
                    if state.epoch == epoch {
                        let restored = match state.visible.clone() {
                            // A newer toggle of the same character owns its state now.
                            Some(current) if state.pending.contains_key(character_id) => current,
                            Some(current) if !Arc::ptr_eq(&current, &optimistic) => {
                                pending.roll_back_onto(&current)
                            }
                            _ => pending.roll_back(),
                        };
                        state.set_visible(Some(restored));
                        self.publish(&state);
                    }
                }

                warn!(
                    character_id = %character_id,
                    error = %source_error,
                    state = %ToggleState::RolledBack,
                    "Follow toggle failed, local state rolled back"
                );

                if let Err(reload_error) = self.load(true).await {
                    warn!(error = %reload_error, "Reload after failed follow toggle also failed");
                }

                Err(RosterError::Toggle(source_error))
            }
        }
    }

    /// Adjust the affinity between the active user and a character.
    ///
    /// The new value is written into the roster without changing how fresh
    /// the entry is. Returns `Ok(None)` when there is no active user.
    pub async fn record_affinity(&self, character_id: &CharacterId, delta: i64) -> Result<Option<i64>> {
        let (user, epoch) = {
            let state = self.inner.state.lock();
            let Some(user) = state.user.clone() else {
                return Ok(None);
            };
            (user, state.epoch)
        };

        let affinity = self
            .inner
            .sources
            .affinity
            .update_affinity(&user, character_id, delta)
            .await
            .map_err(RosterError::Affinity)?;

        let mut state = self.inner.state.lock();
        if state.epoch == epoch {
            if let Some(populated) = state.entry.populated.as_mut() {
                populated.data = with_affinity(&populated.data, character_id, affinity);
            }
            if let Some(visible) = state.visible.clone() {
                state.set_visible(Some(with_affinity(&visible, character_id, affinity)));
                self.publish(&state);
            }
        }

        debug!(character_id = %character_id, delta, affinity, "Affinity updated");
        Ok(Some(affinity))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fetching
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch on behalf of a waiting caller, tracking the loading flag and
    /// recording failures.
    async fn fetch(&self, user: UserId) -> Result<Roster> {
        let epoch = {
            let mut state = self.inner.state.lock();
            state.foreground_fetches += 1;
            self.publish(&state);
            state.epoch
        };
        let guard = ForegroundGuard { cache: self, epoch };

        let result = self
            .start_fetch(user)
            .wait()
            .await
            .unwrap_or(Err(RosterError::Abandoned));

        if let Err(err) = &result {
            let mut state = self.inner.state.lock();
            if state.epoch == epoch {
                state.last_error = Some(err.to_string());
            }
        }
        drop(guard);
        result
    }

    fn refresh_in_background(&self, user: UserId) {
        let handle = self.start_fetch(user.clone());
        debug!(user_id = %user, leader = handle.is_leader(), "Roster stale, refreshing in background");

        tokio::spawn(async move {
            match handle.wait().await {
                Some(Ok(roster)) => {
                    debug!(user_id = %user, characters = roster.len(), "Background roster refresh complete")
                }
                Some(Err(err)) => {
                    warn!(user_id = %user, error = %err, "Background roster refresh failed")
                }
                None => warn!(user_id = %user, "Background roster refresh ended without a result"),
            }
        });
    }

    fn start_fetch(&self, user: UserId) -> FlightHandle<Roster, RosterError> {
        let epoch = self.inner.state.lock().epoch;
        let cache = self.clone();
        let key = user.clone();

        self.inner.flights.join_or_start(key, move || async move {
            debug!(user_id = %user, "Fetching character roster");
            let characters = cache
                .inner
                .sources
                .roster
                .fetch_roster(&user)
                .await
                .map_err(RosterError::Fetch)?;
            Ok(cache.store_fetched(epoch, characters))
        })
    }

    /// Store a fetched roster, re-applying unconfirmed toggles on top.
    fn store_fetched(&self, epoch: u64, characters: Vec<Character>) -> Roster {
        let fetched: Roster = Arc::new(characters);
        let mut state = self.inner.state.lock();

        if state.epoch != epoch {
            debug!("Discarding roster fetched for a previous user");
            return fetched;
        }

        let visible = overlay_pending(&fetched, &state.pending_values());
        state.entry.populate(fetched);
        state.set_visible(Some(Arc::clone(&visible)));
        state.last_error = None;
        self.publish(&state);

        debug!(characters = visible.len(), "Roster cache populated");
        visible
    }

    fn publish(&self, state: &CacheState) {
        trace!(
            characters = state.visible.as_ref().map_or(0, |r| r.len()),
            loading = state.foreground_fetches > 0,
            "Publishing roster snapshot"
        );
        self.inner.snapshots.send_replace(state.snapshot());
    }
}

/// Decrements the foreground fetch count when a waiting caller finishes or
/// is dropped mid-wait.
struct ForegroundGuard<'a> {
    cache: &'a RosterCache,
    epoch: u64,
}

impl Drop for ForegroundGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.cache.inner.state.lock();
        if state.epoch == self.epoch {
            state.foreground_fetches = state.foreground_fetches.saturating_sub(1);
            self.cache.publish(&state);
        }
    }
}

fn with_affinity(roster: &Roster, character_id: &CharacterId, affinity: i64) -> Roster {
    let mut next = roster.to_vec();
    for entity in next.iter_mut().filter(|c| &c.id == character_id) {
        entity.affinity = affinity;
    }
    Arc::new(next)
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct RosterStats {
    /// Characters in the visible roster.
    pub characters: usize,

    /// Followed characters in the visible roster.
    pub followed: usize,

    /// Time since the entry was last populated.
    pub age: Option<Duration>,

    /// Freshness of the entry.
    pub freshness: Freshness,

    /// Whether a fetch for the active user is in flight.
    pub fetch_in_flight: bool,

    /// Follow toggles awaiting confirmation.
    pub pending_toggles: usize,
}

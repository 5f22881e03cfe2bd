//! Single-flight request collapsing.
//!
//! Concurrent callers asking for the same key share one underlying
//! operation. The first caller (the leader) spawns the work onto the tokio
//! runtime; every caller, leader included, waits on a `watch` channel for
//! the shared result. The work runs to completion even if all callers are
//! dropped, and its map entry is removed as soon as it settles, whether it
//! succeeded or failed.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::trace;

type Slot<T, E> = Option<Result<T, E>>;

/// Registry entry for one in-flight operation.
struct Flight<T, E> {
    id: u64,
    rx: watch::Receiver<Slot<T, E>>,
}

type Flights<K, T, E> = Arc<Mutex<HashMap<K, Flight<T, E>>>>;

/// Collapses concurrent requests for the same key into one operation.
pub struct SingleFlight<K, T, E> {
    flights: Flights<K, T, E>,
    next_id: AtomicU64,
}

impl<K, T, E> Default for SingleFlight<K, T, E> {
    fn default() -> Self {
        Self {
            flights: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<K, T, E> SingleFlight<K, T, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight operation for `key`, or start one with `start`.
    ///
    /// `start` is only called when no operation for `key` is in flight. The
    /// future it returns is spawned, so this must be called from within a
    /// tokio runtime.
    pub fn join_or_start<F, Fut>(&self, key: K, start: F) -> FlightHandle<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (id, tx, rx) = {
            let mut flights = self.flights.lock();
            if let Some(flight) = flights.get(&key) {
                trace!(flight_id = flight.id, "Joining in-flight request");
                return FlightHandle {
                    rx: flight.rx.clone(),
                    leader: false,
                };
            }

            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let (tx, rx) = watch::channel(None);
            flights.insert(
                key.clone(),
                Flight {
                    id,
                    rx: rx.clone(),
                },
            );
            (id, tx, rx)
        };

        trace!(flight_id = id, "Starting new request");
        let work = start();
        let guard = SettleGuard {
            flights: Arc::clone(&self.flights),
            key,
            id,
        };

        tokio::spawn(async move {
            let result = work.await;
            // Unregister before publishing so a caller woken by the result
            // never joins a flight that has already settled.
            drop(guard);
            tx.send_replace(Some(result));
        });

        FlightHandle { rx, leader: true }
    }

    /// Whether an operation for `key` is currently in flight.
    pub fn is_in_flight(&self, key: &K) -> bool {
        self.flights.lock().contains_key(key)
    }

    /// Number of operations currently in flight.
    pub fn len(&self) -> usize {
        self.flights.lock().len()
    }

    /// Whether nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.flights.lock().is_empty()
    }

    /// Detach the in-flight operation for `key` without cancelling it.
    ///
    /// Existing waiters still receive its result; the next caller for `key`
    /// starts a fresh operation.
    pub fn forget(&self, key: &K) -> bool {
        self.flights.lock().remove(key).is_some()
    }
}

/// Removes a flight from the registry when its work settles or its task
/// is torn down.
struct SettleGuard<K, T, E>
where
    K: Eq + Hash,
{
    flights: Flights<K, T, E>,
    key: K,
    id: u64,
}

impl<K, T, E> Drop for SettleGuard<K, T, E>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        let mut flights = self.flights.lock();
        // A newer flight may have replaced this one after `forget`.
        if flights.get(&self.key).is_some_and(|f| f.id == self.id) {
            flights.remove(&self.key);
        }
    }
}

/// A caller's handle on an in-flight operation.
pub struct FlightHandle<T, E> {
    rx: watch::Receiver<Slot<T, E>>,
    leader: bool,
}

impl<T, E> FlightHandle<T, E>
where
    T: Clone,
    E: Clone,
{
    /// Whether this caller started the operation.
    pub fn is_leader(&self) -> bool {
        self.leader
    }

    /// Wait for the shared result.
    ///
    /// Returns `None` if the operation was torn down without producing one.
    pub async fn wait(mut self) -> Option<Result<T, E>> {
        loop {
            let current = self.rx.borrow_and_update().clone();
            if current.is_some() {
                return current;
            }
            if self.rx.changed().await.is_err() {
                return self.rx.borrow().clone();
            }
        }
    }
}

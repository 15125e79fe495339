//! In-memory storage for rate limit counters.
//!
//! Every counter lives behind its own mutex so that operations on different
//! keys never wait on each other. The map's shard locks are only held long
//! enough to look up or insert the `Arc`; nobody waits on an entry lock while
//! holding a shard lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use tracing::{debug, trace};

use super::counter::{CounterEntry, ResetWindow};
use super::key::RateKey;

/// Exclusive access to one counter, held until dropped.
pub type EntryGuard = ArcMutexGuard<RawMutex, CounterEntry>;

type SharedEntry = Arc<Mutex<CounterEntry>>;

/// Thread-safe store of windowed counters keyed by [`RateKey`].
///
/// The store is constructed explicitly and shared by `Arc` between the
/// admission controller, the HTTP guard and the eviction sweep.
#[derive(Debug, Default)]
pub struct WindowedCounterStore {
    entries: DashMap<RateKey, SharedEntry>,
}

impl WindowedCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Lock the counter for `key`, creating it if it does not exist yet.
    ///
    /// A new counter starts empty with its window opening at `now`. The
    /// returned guard gives exclusive access to the counter until dropped, so
    /// a read-check-increment sequence performed through it is atomic with
    /// respect to every other caller using the same key.
    pub fn lock(&self, key: &RateKey, window: ResetWindow, now: DateTime<Utc>) -> EntryGuard {
        loop {
            let entry = self.get_or_create(key, window, now);
            let guard = entry.lock_arc();

            // The sweep marks an entry retired and removes it from the map
            // before unlocking, so the next lookup finds a fresh one.
            if !guard.is_retired() {
                return guard;
            }
            trace!(key = %key, "Counter was evicted while waiting, retrying lookup");
        }
    }

    fn get_or_create(&self, key: &RateKey, window: ResetWindow, now: DateTime<Utc>) -> SharedEntry {
        if let Some(existing) = self.entries.get(key) {
            return Arc::clone(existing.value());
        }

        let entry = self.entries.entry(key.clone()).or_insert_with(|| {
            debug!(
                key = %key,
                window = ?window,
                "Creating new rate limit counter"
            );
            Arc::new(Mutex::new(CounterEntry::new(window, now)))
        });
        Arc::clone(entry.value())
    }

    /// Copy of the counter for `key`, if one exists.
    ///
    /// Does not create, roll or otherwise mutate anything.
    pub fn snapshot(&self, key: &RateKey) -> Option<CounterEntry> {
        let entry = self.entries.get(key).map(|e| Arc::clone(e.value()))?;
        let guard = entry.lock();
        Some(guard.clone())
    }

    /// Remove every counter that is empty and whose window has ended.
    ///
    /// Counters past expiry that still hold a count are left alone; the next
    /// admission check on them rolls the window. Keys are snapshotted first
    /// and each candidate is then locked and re-checked on its own, so live
    /// requests are never blocked for the whole traversal.
    ///
    /// Returns the number of counters removed.
    pub fn evict_expired_empty(&self, now: DateTime<Utc>) -> usize {
        let keys: Vec<RateKey> = self.entries.iter().map(|e| e.key().clone()).collect();
        let mut evicted = 0;

        for key in keys {
            let Some(entry) = self.entries.get(&key).map(|e| Arc::clone(e.value())) else {
                continue;
            };

            let mut guard = entry.lock();
            if guard.is_retired() || !guard.is_evictable(now) {
                continue;
            }

            guard.retire();
            if self
                .entries
                .remove_if(&key, |_, current| Arc::ptr_eq(current, &entry))
                .is_some()
            {
                trace!(key = %key, "Evicted expired rate limit counter");
                evicted += 1;
            }
        }

        evicted
    }

    /// Number of tracked counters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every counter.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        let entries: Vec<(RateKey, SharedEntry)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();

        for (key, entry) in entries {
            let mut guard = entry.lock();
            guard.retire();
            self.entries
                .remove_if(&key, |_, current| Arc::ptr_eq(current, &entry));
        }
    }
}

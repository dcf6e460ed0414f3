use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::Receiver;

use crate::tracker::candidate::Candidate;
use crate::tracker::store::{StoreConfig, StoreEvent, TrackingStore};
use crate::tracker::tracked_item::TrackedItem;

/// Cloneable handle serializing all mutations of one [`TrackingStore`].
///
/// Readers only hold the lock long enough to clone the published snapshot.
#[derive(Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<TrackingStore>>,
}

impl SharedStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::from_store(TrackingStore::new(config))
    }

    pub fn from_store(store: TrackingStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    // Every store operation completes before releasing the lock, so a
    // poisoned guard still holds a consistent store.
    fn lock(&self) -> MutexGuard<'_, TrackingStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ingest(&self, candidates: Vec<Candidate>) -> usize {
        self.lock().ingest(candidates)
    }

    pub fn ingest_at(&self, candidates: Vec<Candidate>, timestamp: u64) -> usize {
        self.lock().ingest_at(candidates, timestamp)
    }

    pub fn clear(&self) {
        self.lock().clear()
    }

    pub fn evict_older_than(&self, max_age_ms: u64) -> usize {
        self.lock().evict_older_than(max_age_ms)
    }

    pub fn evict_older_than_at(&self, max_age_ms: u64, now: u64) -> usize {
        self.lock().evict_older_than_at(max_age_ms, now)
    }

    pub fn evict_expired(&self) -> usize {
        self.lock().evict_expired()
    }

    pub fn snapshot(&self) -> Arc<Vec<TrackedItem>> {
        self.lock().snapshot()
    }

    pub fn count(&self) -> usize {
        self.lock().count()
    }

    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.lock().subscribe()
    }

    /// Run `f` with exclusive access to the store.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut TrackingStore) -> R) -> R {
        f(&mut self.lock())
    }
}

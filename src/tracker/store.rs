//! Stateful de-duplication engine.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam_channel::{Receiver, Sender};

use crate::tracker::candidate::Candidate;
use crate::tracker::rect::{Rect, iou_batch};
use crate::tracker::tracked_item::TrackedItem;

/// Configuration for the TrackingStore.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Minimum IoU at which a candidate counts as a duplicate of a tracked item
    pub overlap_threshold: f32,
    /// Age used by [`TrackingStore::evict_expired`]
    pub max_age_ms: u64,
    /// Whether a duplicate match refreshes the matched item's `last_seen`
    pub refresh_on_match: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.5,
            max_age_ms: 60_000,
            refresh_on_match: true,
        }
    }
}

/// Change notification published to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// `added` new items were tracked; `count` is the new total.
    Added { added: usize, count: usize },
    /// All items were removed.
    Cleared,
    /// `removed` items aged out; `count` is the new total.
    Evicted { removed: usize, count: usize },
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Holds the de-duplicated set of tracked items.
///
/// Items are kept in insertion order. After every [`TrackingStore::ingest`]
/// no two items overlap at or above the configured threshold. The item list
/// is published behind an [`Arc`]; a snapshot taken by a reader is never
/// modified; the next mutation copies the list instead.
pub struct TrackingStore {
    items: Arc<Vec<TrackedItem>>,
    config: StoreConfig,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl Default for TrackingStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl TrackingStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            items: Arc::new(Vec::new()),
            config,
            subscribers: Vec::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Absorb one frame's candidates using the current wall-clock time.
    ///
    /// Returns the number of candidates that became new tracked items.
    pub fn ingest(&mut self, candidates: Vec<Candidate>) -> usize {
        self.ingest_at(candidates, now_millis())
    }

    /// Absorb one frame's candidates observed at `timestamp` (ms).
    ///
    /// Candidates are processed in order and each one is compared against
    /// items added earlier in the same call, so overlapping candidates within
    /// a frame collapse into the first of them.
    pub fn ingest_at(&mut self, candidates: Vec<Candidate>, timestamp: u64) -> usize {
        let total = candidates.len();
        let mut added = 0;

        for candidate in candidates {
            if let Err(err) = candidate.bbox.validate() {
                log::warn!("dropping candidate '{}': {err}", candidate.label);
                continue;
            }

            match self.find_overlapping(&candidate.bbox) {
                Some(idx) => {
                    if self.config.refresh_on_match {
                        Arc::make_mut(&mut self.items)[idx].mark_seen(timestamp);
                    }
                    log::trace!(
                        "candidate {:?} is a duplicate of {}",
                        candidate.bbox,
                        self.items[idx].id
                    );
                }
                None => {
                    let item = TrackedItem::from_candidate(candidate, timestamp);
                    log::debug!("tracking new item {} ({})", item.id, item.label);
                    Arc::make_mut(&mut self.items).push(item);
                    added += 1;
                }
            }
        }

        log::debug!(
            "ingested {total} candidates, {added} new, {} tracked",
            self.items.len()
        );

        if added > 0 {
            self.notify(StoreEvent::Added {
                added,
                count: self.items.len(),
            });
        }
        added
    }

    /// Remove every tracked item.
    pub fn clear(&mut self) {
        let was_empty = self.items.is_empty();
        self.items = Arc::new(Vec::new());
        if !was_empty {
            log::debug!("cleared tracked items");
            self.notify(StoreEvent::Cleared);
        }
    }

    /// Remove items not seen for at least `max_age_ms`, measured against the
    /// current wall-clock time. Returns the number removed.
    pub fn evict_older_than(&mut self, max_age_ms: u64) -> usize {
        self.evict_older_than_at(max_age_ms, now_millis())
    }

    /// Remove items whose `now - last_seen >= max_age_ms`.
    pub fn evict_older_than_at(&mut self, max_age_ms: u64, now: u64) -> usize {
        let before = self.items.len();
        if !self.items.iter().any(|t| t.is_expired(now, max_age_ms)) {
            return 0;
        }

        Arc::make_mut(&mut self.items).retain(|t| !t.is_expired(now, max_age_ms));
        let removed = before - self.items.len();
        log::debug!("evicted {removed} items older than {max_age_ms} ms");

        self.notify(StoreEvent::Evicted {
            removed,
            count: self.items.len(),
        });
        removed
    }

    /// Evict using the configured `max_age_ms`.
    pub fn evict_expired(&mut self) -> usize {
        self.evict_older_than(self.config.max_age_ms)
    }

    /// Immutable view of the current items, safe to hold while the store
    /// keeps changing.
    pub fn snapshot(&self) -> Arc<Vec<TrackedItem>> {
        Arc::clone(&self.items)
    }

    pub fn items(&self) -> &[TrackedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of tracked items, as shown by a counter.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Receive a [`StoreEvent`] whenever the tracked set changes.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Check that no two items overlap at or above the threshold.
    pub fn check_invariant(&self) -> bool {
        let rects: Vec<Rect> = self.items.iter().map(|t| t.bbox).collect();
        let ious = iou_batch(&rects, &rects);
        let threshold = self.config.overlap_threshold;

        let (rows, cols) = ious.dim();
        for i in 0..rows {
            for j in (i + 1)..cols {
                if ious[[i, j]] > 0.0 && ious[[i, j]] >= threshold {
                    return false;
                }
            }
        }
        true
    }

    fn find_overlapping(&self, bbox: &Rect) -> Option<usize> {
        let threshold = self.config.overlap_threshold;
        self.items
            .iter()
            .position(|t| t.bbox.overlaps(bbox, threshold))
    }

    fn notify(&mut self, event: StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

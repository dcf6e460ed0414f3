//! De-duplicated, identity-bearing detection held by the tracking store.

use crate::tracker::candidate::Candidate;
use crate::tracker::rect::Rect;

/// A detection that survived de-duplication and persists across frames.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TrackedItem {
    /// Identifier derived from the box geometry at creation time
    pub id: String,
    /// Bounding box as first recorded
    pub bbox: Rect,
    /// Confidence as first recorded
    pub confidence: f32,
    pub label: String,
    /// Creation time, milliseconds since the Unix epoch
    pub first_seen: u64,
    /// Last time this item was created or re-detected
    pub last_seen: u64,
}

impl TrackedItem {
    /// Create a new item from a candidate observed at `timestamp`.
    pub fn from_candidate(candidate: Candidate, timestamp: u64) -> Self {
        Self {
            id: Self::generate_id(&candidate.bbox),
            bbox: candidate.bbox,
            confidence: candidate.confidence,
            label: candidate.label,
            first_seen: timestamp,
            last_seen: timestamp,
        }
    }

    /// Build an id of the form `"{cx}_{cy}_{width}"`, each part truncated
    /// toward zero.
    pub fn generate_id(bbox: &Rect) -> String {
        let (cx, cy) = bbox.center();
        format!("{}_{}_{}", cx as i32, cy as i32, bbox.width() as i32)
    }

    pub fn center(&self) -> (f32, f32) {
        self.bbox.center()
    }

    /// Box size as (width, height).
    pub fn size(&self) -> (f32, f32) {
        (self.bbox.width(), self.bbox.height())
    }

    /// Milliseconds since the item was last seen. Clock skew reads as zero.
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_seen)
    }

    pub fn is_expired(&self, now: u64, max_age_ms: u64) -> bool {
        self.age(now) >= max_age_ms
    }

    pub(crate) fn mark_seen(&mut self, timestamp: u64) {
        self.last_seen = self.last_seen.max(timestamp);
    }
}

use crate::tracker::rect::Rect;

/// A filtered detection from the current frame, not yet given an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Bounding box in TLBR format
    pub bbox: Rect,
    /// Detection confidence in `[0, 1]`
    pub confidence: f32,
    pub label: String,
}

impl Candidate {
    pub fn new(bbox: Rect, confidence: f32, label: impl Into<String>) -> Self {
        Self {
            bbox,
            confidence,
            label: label.into(),
        }
    }
}

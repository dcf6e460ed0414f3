//! Builder for creating RawDetection objects from various box formats.

use crate::integration::detector::{DetectionLabel, RawDetection};
use crate::tracker::Rect;

/// Builder for creating `RawDetection` objects.
#[derive(Debug, Clone, Default)]
pub struct RawDetectionBuilder {
    bbox: Rect,
    labels: Vec<DetectionLabel>,
    tracking_id: Option<u32>,
}

impl RawDetectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (left, top, right, bottom).
    pub fn tlbr(mut self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        self.bbox = Rect::new(left, top, right, bottom);
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::from_xywh(cx, cy, w, h);
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::from_tlwh(x, y, w, h);
        self
    }

    /// Append a classification label.
    pub fn label(mut self, text: impl Into<String>, score: f32) -> Self {
        self.labels.push(DetectionLabel::new(text, score));
        self
    }

    pub fn tracking_id(mut self, id: u32) -> Self {
        self.tracking_id = Some(id);
        self
    }

    pub fn build(self) -> RawDetection {
        RawDetection {
            bbox: self.bbox,
            labels: self.labels,
            tracking_id: self.tracking_id,
        }
    }
}

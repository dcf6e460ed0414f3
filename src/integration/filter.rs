//! Per-frame validation of raw detector output.

use crate::integration::detector::RawDetection;
use crate::tracker::Candidate;

/// Thresholds and fallbacks applied by the [`DetectionFilter`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Boxes narrower or shorter than this (px) are dropped
    pub min_box_size: f32,
    pub min_confidence: f32,
    /// Confidence for unlabeled detections that carry a tracking id
    pub tracked_fallback_confidence: f32,
    /// Confidence for unlabeled detections without a tracking id
    pub untracked_fallback_confidence: f32,
    pub default_label: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_box_size: 20.0,
            min_confidence: 0.2,
            tracked_fallback_confidence: 0.7,
            untracked_fallback_confidence: 0.5,
            default_label: "Product".to_string(),
        }
    }
}

/// Stateless filter turning one frame's detections into candidates.
#[derive(Debug, Clone, Default)]
pub struct DetectionFilter {
    config: FilterConfig,
}

impl DetectionFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Drop noise and resolve label and confidence for each detection.
    pub fn filter(&self, detections: &[RawDetection]) -> Vec<Candidate> {
        let candidates: Vec<Candidate> = detections
            .iter()
            .filter_map(|det| self.to_candidate(det))
            .collect();
        log::debug!(
            "filtered {} detections into {} candidates",
            detections.len(),
            candidates.len()
        );
        candidates
    }

    fn to_candidate(&self, det: &RawDetection) -> Option<Candidate> {
        let bbox = det.bbox;
        if !bbox.is_valid() {
            log::trace!("filtered out malformed box {bbox:?}");
            return None;
        }

        let (width, height) = (bbox.width(), bbox.height());
        if width < self.config.min_box_size || height < self.config.min_box_size {
            log::trace!("filtered out small box {width}x{height}");
            return None;
        }

        let (label, confidence) = match det.labels.first() {
            Some(first) => (first.text.clone(), first.score),
            None => (self.config.default_label.clone(), self.fallback_confidence(det)),
        };

        if !(0.0..=1.0).contains(&confidence) {
            log::trace!("filtered out {label} with malformed confidence {confidence}");
            return None;
        }

        if confidence < self.config.min_confidence {
            log::trace!("filtered out {label} with confidence {confidence}");
            return None;
        }

        Some(Candidate::new(bbox, confidence, label))
    }

    fn fallback_confidence(&self, det: &RawDetection) -> f32 {
        if det.tracking_id.is_some() {
            self.config.tracked_fallback_confidence
        } else {
            self.config.untracked_fallback_confidence
        }
    }
}

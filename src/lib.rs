//! De-duplicating tracker for live object-detection streams.
//!
//! Each frame's raw detections pass through a [`DetectionFilter`] that drops
//! noise, and the surviving [`Candidate`]s are absorbed by a [`TrackingStore`]
//! which keeps one [`TrackedItem`] per real-world object using an IoU
//! overlap test.

pub mod config;
mod error;
pub mod integration;
pub mod tracker;

pub use config::Config;
pub use error::{Error, Result};
pub use integration::{
    DetectionFilter, DetectionLabel, DetectionSource, DetectionWorker, FilterConfig, Frame,
    FrameOutcome, RawDetection, RawDetectionBuilder, TrackerPipeline,
};
pub use tracker::{
    Candidate, Rect, SharedStore, StoreConfig, StoreEvent, TrackedItem, TrackingStore,
};

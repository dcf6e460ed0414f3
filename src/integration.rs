//! Integration module connecting object detection backends with the
//! tracking store.
//!
//! This module provides the [`DetectionSource`] trait for detectors, the
//! [`DetectionFilter`] that turns raw detector output into candidates, and
//! the pipeline and worker that feed a [`TrackingStore`](crate::TrackingStore).

mod builder;
mod detector;
mod filter;
mod pipeline;
mod worker;

pub use builder::RawDetectionBuilder;
pub use detector::{DetectionLabel, DetectionSource, Frame, RawDetection};
pub use filter::{DetectionFilter, FilterConfig};
pub use pipeline::TrackerPipeline;
pub use worker::{DetectionWorker, FrameOutcome};

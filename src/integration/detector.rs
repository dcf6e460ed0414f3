//! Trait and types for object detection backends.

use crate::tracker::Rect;

/// A classification attached to a raw detection.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionLabel {
    pub text: String,
    pub score: f32,
}

impl DetectionLabel {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// One detection as reported by the detector, before filtering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawDetection {
    /// Bounding box in pixel coordinates
    pub bbox: Rect,
    /// Labels in detector order; the first one is authoritative
    pub labels: Vec<DetectionLabel>,
    /// Detector-assigned track token, if the detector runs in stream mode
    pub tracking_id: Option<u32>,
}

/// A camera frame handed to a detector.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Raw image bytes (format depends on the detector)
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Clockwise rotation needed to display the frame upright
    pub rotation_degrees: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            rotation_degrees: 0,
        }
    }

    pub fn with_rotation(mut self, rotation_degrees: u32) -> Self {
        self.rotation_degrees = rotation_degrees;
        self
    }
}

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to the tracker.
///
/// # Example
///
/// ```ignore
/// use shelftrack::{DetectionSource, Frame, RawDetection};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, Self::Error> {
///         // Run inference and return detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error: std::fmt::Display;

    /// Run inference on one frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, Self::Error>;
}

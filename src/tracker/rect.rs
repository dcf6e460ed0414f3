use crate::error::{Error, Result};

/// Axis-aligned bounding box stored by its four edges.
///
/// Coordinates live in whatever pixel space the upstream detector reports;
/// no transform is applied here. A well-formed box has finite edges with
/// `left <= right` and `top <= bottom`.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Create a Rect from its edges (TLBR order).
    #[inline]
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a Rect from TLWH format (top-left x, top-left y, width, height).
    #[inline]
    pub fn from_tlwh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Create a Rect from its center point and size.
    #[inline]
    pub fn from_xywh(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(
            cx - width / 2.0,
            cy - height / 2.0,
            cx + width / 2.0,
            cy + height / 2.0,
        )
    }

    /// Convert to TLBR format: (left, top, right, bottom).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.left, self.top, self.right, self.bottom]
    }

    /// Convert to TLWH format: (x, y, width, height).
    #[inline]
    pub fn to_tlwh(&self) -> [f32; 4] {
        [self.left, self.top, self.width(), self.height()]
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Whether the edges are finite and ordered.
    pub fn is_valid(&self) -> bool {
        self.to_tlbr().iter().all(|v| v.is_finite())
            && self.left <= self.right
            && self.top <= self.bottom
    }

    /// Like [`Rect::is_valid`], but describes what is wrong.
    pub fn validate(&self) -> Result<()> {
        if !self.to_tlbr().iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidInput(format!("non-finite box edges {self:?}")));
        }
        if self.left > self.right || self.top > self.bottom {
            return Err(Error::InvalidInput(format!(
                "inverted box {self:?} (width {}, height {})",
                self.width(),
                self.height()
            )));
        }
        Ok(())
    }

    /// Intersection rectangle, or `None` when the boxes do not overlap.
    ///
    /// Boxes that only share an edge do not intersect.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);

        if left < right && top < bottom {
            Some(Rect::new(left, top, right, bottom))
        } else {
            None
        }
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    pub fn iou(&self, other: &Rect) -> f32 {
        let Some(inter) = self.intersection(other) else {
            return 0.0;
        };
        let inter_area = inter.area();
        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }

    /// True when the boxes intersect and their IoU reaches `threshold`.
    pub fn overlaps(&self, other: &Rect, threshold: f32) -> bool {
        self.intersection(other).is_some() && self.iou(other) >= threshold
    }
}

use ndarray::Array2;

/// Calculate IoU matrix between two sets of bounding boxes.
///
/// Returns a matrix of shape (M, N) where M is the length of `boxes_a`
/// and N is the length of `boxes_b`.
pub fn iou_batch(boxes_a: &[Rect], boxes_b: &[Rect]) -> Array2<f32> {
    let mut ious = Array2::zeros((boxes_a.len(), boxes_b.len()));
    for (i, a) in boxes_a.iter().enumerate() {
        for (j, b) in boxes_b.iter().enumerate() {
            ious[[i, j]] = a.iou(b);
        }
    }
    ious
}

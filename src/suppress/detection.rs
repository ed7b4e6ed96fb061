//! Final detection records and their ordering.

use std::cmp::Ordering;

use crate::geometry::BBox;

/// A box with a confidence and a foreground class index.
///
/// Fields are read through accessors; a detection does not change after it is
/// built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    bbox: BBox,
    score: f32,
    class_index: usize,
}

impl Detection {
    /// Creates a detection.
    pub fn new(bbox: BBox, score: f32, class_index: usize) -> Self {
        Self {
            bbox,
            score,
            class_index,
        }
    }

    /// Box in original-image pixel coordinates.
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// Confidence score.
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Class index; 0 is background and never emitted by the detector.
    pub fn class_index(&self) -> usize {
        self.class_index
    }
}

fn detection_cmp_desc(a: &Detection, b: &Detection) -> Ordering {
    b.score.total_cmp(&a.score)
}

/// Sorts detections by descending score.
///
/// The sort is stable, so equal scores keep their original order.
pub fn sort_detections_desc(detections: &mut [Detection]) {
    detections.sort_by(detection_cmp_desc);
}

//! Score filtering and per-class non-maximum suppression.
//!
//! Candidates are filtered per class, sorted by descending confidence and then
//! swept greedily by IoU. Classes are processed independently and never
//! suppress each other.

pub(crate) mod detection;
pub(crate) mod filter;
pub(crate) mod nms;

pub use detection::{sort_detections_desc, Detection};
pub use filter::filter_by_score;
pub use nms::{iou, non_max_suppress, non_max_suppress_above};

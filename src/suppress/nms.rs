//! Greedy IoU-based non-maximum suppression.

use crate::geometry::BBox;
use crate::suppress::detection::{sort_detections_desc, Detection};

/// Intersection-over-union of two boxes with inclusive coordinates.
///
/// Disjoint boxes give 0. For boxes with non-positive area the result is
/// whatever the arithmetic yields (possibly NaN), which never suppresses.
pub fn iou(a: &BBox, b: &BBox) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);
    let iw = (ix2 - ix1 + 1.0).max(0.0);
    let ih = (iy2 - iy1 + 1.0).max(0.0);
    let inter = iw * ih;
    inter / (a.area() + b.area() - inter)
}

/// A later box is dropped when its overlap exceeds the threshold. Exact
/// duplicates (IoU of 1) are always dropped, so a threshold of 1.0 still
/// removes repeated boxes.
fn suppresses(overlap: f32, iou_threshold: f32) -> bool {
    overlap > iou_threshold || overlap >= 1.0
}

/// Sweeps sorted candidates, stopping at the first score below `min_score`.
fn greedy_sweep(sorted: &[Detection], iou_threshold: f32, min_score: Option<f32>) -> Vec<Detection> {
    let mut keep = vec![true; sorted.len()];
    let mut out = Vec::new();
    for i in 0..sorted.len() {
        if !keep[i] {
            continue;
        }
        if min_score.is_some_and(|min| sorted[i].score() < min) {
            break;
        }
        let anchor = sorted[i].bbox();
        for j in (i + 1)..sorted.len() {
            if keep[j] && suppresses(iou(&anchor, &sorted[j].bbox()), iou_threshold) {
                keep[j] = false;
            }
        }
        out.push(sorted[i]);
    }
    out
}

/// Sorts candidates by descending score and greedily drops every box that
/// overlaps an already kept, higher-scoring box by more than `iou_threshold`.
///
/// Survivors are returned in descending score order. Run once per class.
/// Exact duplicates are dropped for any threshold, including one above 1.0;
/// the detector only accepts thresholds in `[0, 1]`.
pub fn non_max_suppress(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    sort_detections_desc(&mut candidates);
    greedy_sweep(&candidates, iou_threshold, None)
}

/// Like [`non_max_suppress`], but takes unfiltered candidates and stops the
/// sweep at the first one scoring below `score_threshold`.
///
/// Because the sweep runs in descending score order, the output equals
/// thresholding first and suppressing afterwards.
pub fn non_max_suppress_above(
    mut candidates: Vec<Detection>,
    iou_threshold: f32,
    score_threshold: f32,
) -> Vec<Detection> {
    sort_detections_desc(&mut candidates);
    greedy_sweep(&candidates, iou_threshold, Some(score_threshold))
}

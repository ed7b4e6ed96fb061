//! Per-class decode for a single forward pass.
//!
//! For each foreground class, proposals that clear the score threshold are
//! decoded in original-image coordinates, clipped, and suppressed.

use crate::detector::outputs::ClassOutputs;
use crate::detector::{DecodeFrame, DetectorConfig};
use crate::geometry::{clip_to_image, decode_box, BBox};
use crate::suppress::{filter_by_score, non_max_suppress, Detection};
use crate::trace::{trace_debug, trace_span};

/// Thresholds, decodes and suppresses every foreground class.
///
/// `proposals` are at the network input scale; they are divided by the frame's
/// scale factor before decoding. Output is grouped by ascending class, each
/// group in descending score order.
pub(crate) fn decode_per_class(
    proposals: &[BBox],
    outputs: &ClassOutputs<'_>,
    frame: DecodeFrame,
    cfg: &DetectorConfig,
) -> Vec<Detection> {
    let _span = trace_span!("decode_classes", proposals = proposals.len()).entered();

    let mut results = Vec::new();
    for class in 1..outputs.scores.num_classes() {
        let candidates: Vec<Detection> =
            filter_by_score(&outputs.scores, class, cfg.score_threshold)
                .into_iter()
                .map(|(roi, score)| {
                    let roi_box = proposals[roi].unscaled(frame.scale_factor);
                    let decoded = decode_box(roi_box, outputs.deltas.get(roi, class));
                    let clipped = clip_to_image(decoded, frame.width, frame.height);
                    Detection::new(clipped, score, class)
                })
                .collect();
        if candidates.is_empty() {
            continue;
        }
        let before = candidates.len();
        let kept = non_max_suppress(candidates, cfg.nms_iou_threshold);
        trace_debug!("class_nms", class = class, candidates = before, kept = kept.len());
        results.extend(kept);
    }
    results
}

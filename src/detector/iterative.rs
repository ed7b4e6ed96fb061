//! Iterative proposal refinement.
//!
//! Each refinement round moves every proposal to the box predicted for its
//! best foreground class, writes the moved proposals back into the engine and
//! re-runs the network from the ROI-pooling layer. The backbone features do
//! not depend on the proposals, so only the ROI head is recomputed.
//!
//! Refinement follows the single best class, but the final decode still
//! reports every class that clears the threshold for a proposal.

use crate::detector::outputs::{ClassOutputs, NetworkOutputs};
use crate::detector::{DecodeFrame, DetectorConfig};
use crate::engine::Engine;
use crate::geometry::{clip_to_image, decode_box, BBox, ImageMeta};
use crate::suppress::{non_max_suppress_above, Detection};
use crate::tensor::{RoiTable, Tensor, ROI_ROW_LEN};
use crate::trace::{trace_debug, trace_span};
use crate::util::FrcnnResult;

/// Proposals owned by one `detect` call while they are being refined.
///
/// Boxes stay at the network input scale. The set starts as the engine's
/// first-pass proposals and changes only through [`ProposalSet::refine`].
#[derive(Clone, Debug, PartialEq)]
pub struct ProposalSet {
    boxes: Vec<BBox>,
}

impl ProposalSet {
    /// Copies proposals out of an engine blob.
    pub fn from_table(rois: &RoiTable<'_>) -> Self {
        Self {
            boxes: rois.iter().collect(),
        }
    }

    /// Wraps boxes already at the network input scale.
    pub fn from_boxes(boxes: Vec<BBox>) -> Self {
        Self { boxes }
    }

    /// Number of proposals.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Returns true when there are no proposals.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Current proposal boxes.
    pub fn boxes(&self) -> &[BBox] {
        &self.boxes
    }

    /// Replaces each proposal with its decode under the best foreground class,
    /// clipped to the `width x height` network input.
    pub(crate) fn refine(&mut self, outputs: &ClassOutputs<'_>, width: f32, height: f32) {
        for (roi, bbox) in self.boxes.iter_mut().enumerate() {
            let class = outputs.scores.best_foreground_class(roi);
            let decoded = decode_box(*bbox, outputs.deltas.get(roi, class));
            *bbox = clip_to_image(decoded, width, height);
        }
    }

    /// Packs the proposals as an `(N, 5, 1, 1)` blob with batch index 0.
    pub fn to_tensor(&self) -> FrcnnResult<Tensor> {
        let mut data = Vec::with_capacity(self.boxes.len() * ROI_ROW_LEN);
        for b in &self.boxes {
            data.extend_from_slice(&[0.0, b.x1, b.y1, b.x2, b.y2]);
        }
        Tensor::new(vec![self.boxes.len(), ROI_ROW_LEN, 1, 1], data)
    }
}

/// Runs `rounds - 1` refinements on the engine, then the final decode.
///
/// Expects a full forward pass to have run already.
pub(crate) fn detect_iterative<E: Engine + ?Sized>(
    engine: &mut E,
    roi_pool_layer: usize,
    rounds: usize,
    meta: &ImageMeta,
    frame: DecodeFrame,
    cfg: &DetectorConfig,
) -> FrcnnResult<Vec<Detection>> {
    let names = &cfg.names;
    let mut proposals = {
        let outputs = NetworkOutputs::read(&*engine, names, cfg.num_classes)?;
        ProposalSet::from_table(&outputs.rois)
    };

    for round in 1..rounds {
        let _span = trace_span!("refine_round", round = round).entered();
        {
            let outputs = ClassOutputs::read(&*engine, names, cfg.num_classes)?;
            outputs.expect_rois(names, proposals.len())?;
            proposals.refine(
                &outputs,
                meta.scaled_width as f32,
                meta.scaled_height as f32,
            );
        }
        engine.set_tensor(&names.rois, &proposals.to_tensor()?)?;
        engine.forward_from(roi_pool_layer)?;
        trace_debug!(
            "refined_proposals",
            round = round,
            proposals = proposals.len()
        );
    }

    let outputs = ClassOutputs::read(&*engine, names, cfg.num_classes)?;
    outputs.expect_rois(names, proposals.len())?;
    Ok(decode_sorted_per_class(
        proposals.boxes(),
        &outputs,
        frame,
        cfg,
    ))
}

/// Final decode after refinement.
///
/// Every proposal is decoded for every foreground class; the threshold is
/// applied while sweeping in descending score order, which stops a class at
/// its first sub-threshold candidate.
fn decode_sorted_per_class(
    proposals: &[BBox],
    outputs: &ClassOutputs<'_>,
    frame: DecodeFrame,
    cfg: &DetectorConfig,
) -> Vec<Detection> {
    let _span = trace_span!("decode_classes", proposals = proposals.len()).entered();

    let mut results = Vec::new();
    for class in 1..outputs.scores.num_classes() {
        let candidates: Vec<Detection> = proposals
            .iter()
            .enumerate()
            .map(|(roi, proposal)| {
                let roi_box = proposal.unscaled(frame.scale_factor);
                let decoded = decode_box(roi_box, outputs.deltas.get(roi, class));
                Detection::new(
                    clip_to_image(decoded, frame.width, frame.height),
                    outputs.scores.get(roi, class),
                    class,
                )
            })
            .collect();
        let kept = non_max_suppress_above(candidates, cfg.nms_iou_threshold, cfg.score_threshold);
        trace_debug!("class_nms", class = class, kept = kept.len());
        results.extend(kept);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::ClassScores;

    #[test]
    fn tensor_rows_carry_batch_zero() {
        let set = ProposalSet::from_boxes(vec![
            BBox::new(1.0, 2.0, 3.0, 4.0),
            BBox::new(5.0, 6.0, 7.0, 8.0),
        ]);
        let t = set.to_tensor().unwrap();
        assert_eq!(t.shape(), &[2, 5, 1, 1]);
        assert_eq!(
            t.data(),
            &[0.0, 1.0, 2.0, 3.0, 4.0, 0.0, 5.0, 6.0, 7.0, 8.0]
        );
        let table = RoiTable::from_tensor("rois", t.view()).unwrap();
        assert_eq!(ProposalSet::from_table(&table), set);
    }

    #[test]
    fn refine_follows_best_class_and_clips_to_input() {
        let mut set = ProposalSet::from_boxes(vec![BBox::new(10.0, 10.0, 29.0, 29.0)]);
        let score_data = [0.1, 0.2, 0.7];
        // class 1 would shift left, class 2 shifts right by a quarter width.
        let delta_data = [
            0.0, 0.0, 0.0, 0.0, //
            -0.25, 0.0, 0.0, 0.0, //
            0.25, 0.0, 0.0, 0.0,
        ];
        let scores_t = Tensor::new(vec![1, 3], score_data.to_vec()).unwrap();
        let deltas_t = Tensor::new(vec![1, 12], delta_data.to_vec()).unwrap();
        let outputs = ClassOutputs {
            scores: ClassScores::from_tensor("cls_prob", scores_t.view()).unwrap(),
            deltas: crate::tensor::ClassDeltas::from_tensor("bbox_pred", deltas_t.view(), 3)
                .unwrap(),
        };
        set.refine(&outputs, 32.0, 32.0);
        assert_eq!(set.boxes(), &[BBox::new(15.0, 10.0, 31.0, 29.0)]);
    }
}

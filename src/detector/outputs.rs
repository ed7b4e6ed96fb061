//! Validated access to the detector's output blobs.

use crate::detector::config::TensorNames;
use crate::engine::Engine;
use crate::tensor::{ClassDeltas, ClassScores, RoiTable, TensorRef};
use crate::util::{FrcnnError, FrcnnResult};

fn lookup<'a, E: Engine + ?Sized>(engine: &'a E, name: &str) -> FrcnnResult<TensorRef<'a>> {
    engine.tensor(name).ok_or_else(|| FrcnnError::MissingTensor {
        name: name.to_owned(),
    })
}

/// Class scores and box deltas for the current proposals.
pub(crate) struct ClassOutputs<'a> {
    pub(crate) scores: ClassScores<'a>,
    pub(crate) deltas: ClassDeltas<'a>,
}

impl<'a> ClassOutputs<'a> {
    /// Reads `cls_prob` and `bbox_pred`, checking the class count against the
    /// configuration and the row counts against each other.
    pub(crate) fn read<E: Engine + ?Sized>(
        engine: &'a E,
        names: &TensorNames,
        num_classes: usize,
    ) -> FrcnnResult<Self> {
        let scores = ClassScores::from_tensor(&names.cls_prob, lookup(engine, &names.cls_prob)?)?;
        if scores.num_classes() != num_classes {
            return Err(FrcnnError::ClassCountMismatch {
                expected: num_classes,
                got: scores.num_classes(),
            });
        }
        let deltas =
            ClassDeltas::from_tensor(&names.bbox_pred, lookup(engine, &names.bbox_pred)?, num_classes)?;
        if scores.num_rois() != deltas.num_rois() {
            return Err(FrcnnError::ProposalCountMismatch {
                name: names.cls_prob.clone(),
                expected: deltas.num_rois(),
                got: scores.num_rois(),
            });
        }
        Ok(Self { scores, deltas })
    }

    /// Number of proposals the outputs describe.
    pub(crate) fn num_rois(&self) -> usize {
        self.deltas.num_rois()
    }

    /// Fails unless the outputs cover exactly `expected` proposals.
    pub(crate) fn expect_rois(&self, names: &TensorNames, expected: usize) -> FrcnnResult<()> {
        if self.num_rois() != expected {
            return Err(FrcnnError::ProposalCountMismatch {
                name: names.bbox_pred.clone(),
                expected,
                got: self.num_rois(),
            });
        }
        Ok(())
    }
}

/// All three outputs of a full forward pass.
pub(crate) struct NetworkOutputs<'a> {
    pub(crate) rois: RoiTable<'a>,
    pub(crate) classes: ClassOutputs<'a>,
}

impl<'a> NetworkOutputs<'a> {
    pub(crate) fn read<E: Engine + ?Sized>(
        engine: &'a E,
        names: &TensorNames,
        num_classes: usize,
    ) -> FrcnnResult<Self> {
        let classes = ClassOutputs::read(engine, names, num_classes)?;
        let rois = RoiTable::from_tensor(&names.rois, lookup(engine, &names.rois)?)?;
        if rois.len() != classes.num_rois() {
            return Err(FrcnnError::ProposalCountMismatch {
                name: names.rois.clone(),
                expected: classes.num_rois(),
                got: rois.len(),
            });
        }
        Ok(Self { rois, classes })
    }
}

//! Detector configuration.

use crate::util::{FrcnnError, FrcnnResult};

/// Blob and layer names the detector looks up in the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorNames {
    /// Region proposals, `(N, 5)`.
    pub rois: String,
    /// Class probabilities, `(N, C)`.
    pub cls_prob: String,
    /// Per-class box deltas, `(N, 4C)`.
    pub bbox_pred: String,
    /// Prefix identifying the ROI-pooling layer; exactly one layer must match.
    pub roi_pool_prefix: String,
}

impl Default for TensorNames {
    fn default() -> Self {
        Self {
            rois: "rois".to_owned(),
            cls_prob: "cls_prob".to_owned(),
            bbox_pred: "bbox_pred".to_owned(),
            roi_pool_prefix: "roi_pool".to_owned(),
        }
    }
}

/// How `detect` post-processes the network outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionMode {
    /// One forward pass, then per-class decode and NMS.
    SinglePass,
    /// `rounds - 1` proposal refinements through partial forward passes, then
    /// the per-class decode.
    Iterative { rounds: usize },
}

/// Configuration for a [`Detector`](crate::Detector).
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Per-channel mean subtracted from the input, in image channel order.
    pub pixel_means: [f32; 3],
    /// Target length of the shorter image side. Exactly one entry is supported.
    pub test_scales: Vec<f32>,
    /// Upper bound on the longer image side after scaling.
    pub test_max_size: f32,
    /// Minimum class score for a detection.
    pub score_threshold: f32,
    /// IoU above which a lower-scoring box of the same class is suppressed.
    /// Must lie in `[0, 1]`.
    pub nms_iou_threshold: f32,
    /// Number of classes including background.
    pub num_classes: usize,
    /// `None` for single-pass detection, `Some(k)` with `k >= 1` for iterative.
    pub iterative_rounds: Option<usize>,
    /// Engine blob and layer names.
    pub names: TensorNames,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            pixel_means: [102.9801, 115.9465, 122.7717],
            test_scales: vec![600.0],
            test_max_size: 1000.0,
            score_threshold: 0.5,
            nms_iou_threshold: 0.3,
            num_classes: 21,
            iterative_rounds: None,
            names: TensorNames::default(),
        }
    }
}

impl DetectorConfig {
    /// Checks every precondition the detector relies on.
    pub fn validate(&self) -> FrcnnResult<()> {
        if self.test_scales.len() != 1 {
            return Err(FrcnnError::MultiScale {
                count: self.test_scales.len(),
            });
        }
        let scale = self.test_scales[0];
        if !(scale.is_finite() && scale > 0.0) {
            return Err(FrcnnError::InvalidScale {
                name: "test scale",
                value: scale,
            });
        }
        if !(self.test_max_size.is_finite() && self.test_max_size > 0.0) {
            return Err(FrcnnError::InvalidScale {
                name: "test max size",
                value: self.test_max_size,
            });
        }
        if !self.score_threshold.is_finite() {
            return Err(FrcnnError::InvalidThreshold {
                name: "score threshold",
                value: self.score_threshold,
            });
        }
        if !(0.0..=1.0).contains(&self.nms_iou_threshold) {
            return Err(FrcnnError::InvalidThreshold {
                name: "NMS IoU threshold",
                value: self.nms_iou_threshold,
            });
        }
        if self.num_classes < 2 {
            return Err(FrcnnError::InvalidClassCount {
                num_classes: self.num_classes,
            });
        }
        if let Some(0) = self.iterative_rounds {
            return Err(FrcnnError::InvalidIterativeRounds { rounds: 0 });
        }
        Ok(())
    }

    /// The single configured short-side target.
    pub fn test_scale(&self) -> f32 {
        self.test_scales.first().copied().unwrap_or(0.0)
    }

    /// Detection mode derived from `iterative_rounds`.
    pub fn mode(&self) -> DetectionMode {
        match self.iterative_rounds {
            None => DetectionMode::SinglePass,
            Some(rounds) => DetectionMode::Iterative { rounds },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_single_pass() {
        let cfg = DetectorConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.mode(), DetectionMode::SinglePass);
    }

    #[test]
    fn rejects_multi_scale() {
        let cfg = DetectorConfig {
            test_scales: vec![600.0, 800.0],
            ..DetectorConfig::default()
        };
        assert_eq!(cfg.validate(), Err(FrcnnError::MultiScale { count: 2 }));
    }

    #[test]
    fn rejects_zero_rounds() {
        let cfg = DetectorConfig {
            iterative_rounds: Some(0),
            ..DetectorConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(FrcnnError::InvalidIterativeRounds { rounds: 0 })
        );
    }

    #[test]
    fn rejects_background_only() {
        let cfg = DetectorConfig {
            num_classes: 1,
            ..DetectorConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(FrcnnError::InvalidClassCount { num_classes: 1 })
        );
    }

    #[test]
    fn nms_threshold_must_be_an_overlap_ratio() {
        for value in [-0.1, 1.5, f32::INFINITY] {
            let cfg = DetectorConfig {
                nms_iou_threshold: value,
                ..DetectorConfig::default()
            };
            assert_eq!(
                cfg.validate(),
                Err(FrcnnError::InvalidThreshold {
                    name: "NMS IoU threshold",
                    value,
                })
            );
        }
        for value in [0.0, 1.0] {
            let cfg = DetectorConfig {
                nms_iou_threshold: value,
                ..DetectorConfig::default()
            };
            assert!(cfg.validate().is_ok());
        }
    }
}

//! Engine that replays network outputs recorded to JSON.
//!
//! A dump holds the layer names, the first-pass `rois`, `cls_prob` and
//! `bbox_pred` rows, and optionally one stage per refinement round. Each
//! partial pass serves the next stage; once the stages run out the last
//! scores stay in place.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;

use frcnn::{Engine, FrcnnError, FrcnnResult, Tensor, TensorNames, TensorRef};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StageDump {
    pub cls_prob: Vec<Vec<f32>>,
    pub bbox_pred: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct NetworkDump {
    pub layers: Vec<String>,
    /// Rows of `[batch, x1, y1, x2, y2]` at the network input scale.
    pub rois: Vec<[f32; 5]>,
    pub cls_prob: Vec<Vec<f32>>,
    pub bbox_pred: Vec<Vec<f32>>,
    #[serde(default)]
    pub refinements: Vec<StageDump>,
}

struct Stage {
    cls_prob: Tensor,
    bbox_pred: Tensor,
}

pub struct ReplayEngine {
    names: TensorNames,
    layers: Vec<String>,
    initial_rois: Tensor,
    initial: Stage,
    pending: VecDeque<Stage>,
    blobs: HashMap<String, Tensor>,
}

fn matrix(name: &str, rows: Vec<Vec<f32>>) -> FrcnnResult<Tensor> {
    let width = rows.first().map_or(0, Vec::len);
    let count = rows.len();
    let mut data = Vec::with_capacity(count * width);
    for row in rows {
        if row.len() != width {
            return Err(FrcnnError::TensorSize {
                name: name.to_owned(),
                expected: width,
                got: row.len(),
            });
        }
        data.extend(row);
    }
    Tensor::new(vec![count, width, 1, 1], data)
}

impl Stage {
    fn from_dump(names: &TensorNames, dump: StageDump) -> FrcnnResult<Self> {
        Ok(Self {
            cls_prob: matrix(&names.cls_prob, dump.cls_prob)?,
            bbox_pred: matrix(&names.bbox_pred, dump.bbox_pred)?,
        })
    }
}

impl ReplayEngine {
    pub fn from_dump(dump: NetworkDump, names: TensorNames) -> FrcnnResult<Self> {
        let rois: Vec<f32> = dump.rois.iter().flatten().copied().collect();
        let initial_rois = Tensor::new(vec![dump.rois.len(), 5, 1, 1], rois)?;
        let initial = Stage::from_dump(
            &names,
            StageDump {
                cls_prob: dump.cls_prob,
                bbox_pred: dump.bbox_pred,
            },
        )?;
        let pending = dump
            .refinements
            .into_iter()
            .map(|stage| Stage::from_dump(&names, stage))
            .collect::<FrcnnResult<VecDeque<_>>>()?;
        Ok(Self {
            names,
            layers: dump.layers,
            initial_rois,
            initial,
            pending,
            blobs: HashMap::new(),
        })
    }

    pub fn open(path: &Path, names: TensorNames) -> FrcnnResult<Self> {
        let text = fs::read_to_string(path).map_err(|err| FrcnnError::Engine {
            reason: format!("{}: {err}", path.display()),
        })?;
        let dump: NetworkDump = serde_json::from_str(&text).map_err(|err| FrcnnError::Engine {
            reason: format!("{}: {err}", path.display()),
        })?;
        Self::from_dump(dump, names)
    }

    fn publish(&mut self, cls_prob: Tensor, bbox_pred: Tensor) {
        self.blobs.insert(self.names.cls_prob.clone(), cls_prob);
        self.blobs.insert(self.names.bbox_pred.clone(), bbox_pred);
    }
}

impl Engine for ReplayEngine {
    fn set_input(&mut self, index: usize, tensor: &Tensor) -> FrcnnResult<()> {
        let name = match index {
            frcnn::lowlevel::IMAGE_INPUT => "data",
            frcnn::lowlevel::IM_INFO_INPUT => "im_info",
            _ => {
                return Err(FrcnnError::IndexOutOfBounds {
                    index,
                    len: 2,
                    context: "network input",
                })
            }
        };
        self.blobs.insert(name.to_owned(), tensor.clone());
        Ok(())
    }

    fn forward(&mut self) -> FrcnnResult<f32> {
        self.blobs
            .insert(self.names.rois.clone(), self.initial_rois.clone());
        let cls_prob = self.initial.cls_prob.clone();
        let bbox_pred = self.initial.bbox_pred.clone();
        self.publish(cls_prob, bbox_pred);
        Ok(0.0)
    }

    fn forward_from(&mut self, layer: usize) -> FrcnnResult<()> {
        if layer >= self.layers.len() {
            return Err(FrcnnError::IndexOutOfBounds {
                index: layer,
                len: self.layers.len(),
                context: "layer",
            });
        }
        if let Some(stage) = self.pending.pop_front() {
            self.publish(stage.cls_prob, stage.bbox_pred);
        }
        Ok(())
    }

    fn tensor(&self, name: &str) -> Option<TensorRef<'_>> {
        self.blobs.get(name).map(Tensor::view)
    }

    fn set_tensor(&mut self, name: &str, tensor: &Tensor) -> FrcnnResult<()> {
        self.blobs.insert(name.to_owned(), tensor.clone());
        Ok(())
    }

    fn layer_names(&self) -> Vec<String> {
        self.layers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frcnn::{Detector, DetectorConfig, ImageView};

    const DUMP: &str = r#"{
        "layers": ["data", "conv5_3", "roi_pool5", "fc7", "cls_prob"],
        "rois": [[0, 10, 10, 29, 29]],
        "cls_prob": [[0.1, 0.2, 0.7]],
        "bbox_pred": [[0, 0, 0, 0, 0, 0, 0, 0, 0.25, 0, 0, 0]],
        "refinements": [
            { "cls_prob": [[0.1, 0.8, 0.1]], "bbox_pred": [[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]] }
        ]
    }"#;

    fn config(rounds: Option<usize>) -> DetectorConfig {
        DetectorConfig {
            test_scales: vec![30.0],
            test_max_size: 100.0,
            num_classes: 3,
            iterative_rounds: rounds,
            ..DetectorConfig::default()
        }
    }

    fn detect(rounds: Option<usize>) -> Vec<frcnn::Detection> {
        let dump: NetworkDump = serde_json::from_str(DUMP).unwrap();
        let engine = ReplayEngine::from_dump(dump, TensorNames::default()).unwrap();
        let mut detector = Detector::new(engine, config(rounds)).unwrap();
        let image = vec![0.0f32; 40 * 30 * 3];
        let view = ImageView::from_slice(&image, 40, 30).unwrap();
        detector.detect(view).unwrap()
    }

    #[test]
    fn single_pass_uses_first_stage() {
        let dets = detect(None);
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_index(), 2);
        assert_eq!(dets[0].bbox().to_array(), [15.0, 10.0, 34.0, 29.0]);
    }

    #[test]
    fn refinement_serves_next_stage() {
        let dets = detect(Some(2));
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_index(), 1);
        assert_eq!(dets[0].score(), 0.8);
        assert_eq!(dets[0].bbox().to_array(), [15.0, 10.0, 34.0, 29.0]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = matrix("cls_prob", vec![vec![0.1, 0.9], vec![1.0]]).unwrap_err();
        assert_eq!(
            err,
            FrcnnError::TensorSize {
                name: "cls_prob".to_owned(),
                expected: 2,
                got: 1,
            }
        );
    }
}

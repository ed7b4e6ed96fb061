//! Scripted engine used by the detector integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use frcnn::{Engine, FrcnnError, FrcnnResult, Tensor, TensorRef};

pub const NUM_CLASSES: usize = 3;

/// Class scores and deltas served by one forward call.
#[derive(Clone)]
pub struct Stage {
    pub cls_prob: Tensor,
    pub bbox_pred: Tensor,
}

impl Stage {
    pub fn new(scores: Vec<f32>, deltas: Vec<f32>, num_classes: usize) -> Self {
        let rois = scores.len() / num_classes;
        Self {
            cls_prob: Tensor::new(vec![rois, num_classes], scores).unwrap(),
            bbox_pred: Tensor::new(vec![rois, num_classes * 4, 1, 1], deltas).unwrap(),
        }
    }
}

/// Engine that replays fixed outputs.
///
/// `forward` publishes the initial proposals and stage; each `forward_from`
/// publishes the next scripted stage, or leaves the current scores in place
/// once the script runs out. Every call is recorded.
pub struct StubEngine {
    pub layers: Vec<String>,
    pub inputs: HashMap<usize, Tensor>,
    blobs: HashMap<String, Tensor>,
    initial_rois: Tensor,
    initial: Stage,
    refinements: VecDeque<Stage>,
    pub forward_calls: usize,
    pub forward_from_calls: Vec<usize>,
    pub written_rois: Vec<Tensor>,
}

impl StubEngine {
    pub fn new(rois: Vec<[f32; 4]>, initial: Stage) -> Self {
        let data = rois
            .iter()
            .flat_map(|b| [0.0, b[0], b[1], b[2], b[3]])
            .collect();
        Self {
            layers: default_layers(),
            inputs: HashMap::new(),
            blobs: HashMap::new(),
            initial_rois: Tensor::new(vec![rois.len(), 5, 1, 1], data).unwrap(),
            initial,
            refinements: VecDeque::new(),
            forward_calls: 0,
            forward_from_calls: Vec::new(),
            written_rois: Vec::new(),
        }
    }

    pub fn with_layers(mut self, layers: &[&str]) -> Self {
        self.layers = layers.iter().map(|s| (*s).to_owned()).collect();
        self
    }

    pub fn with_refinement(mut self, stage: Stage) -> Self {
        self.refinements.push_back(stage);
        self
    }

    pub fn with_raw_rois(mut self, rois: Tensor) -> Self {
        self.initial_rois = rois;
        self
    }

    fn publish(&mut self, stage: Stage) {
        self.blobs.insert("cls_prob".to_owned(), stage.cls_prob);
        self.blobs.insert("bbox_pred".to_owned(), stage.bbox_pred);
    }
}

pub fn default_layers() -> Vec<String> {
    [
        "data",
        "im_info",
        "conv5_3",
        "rpn_cls_score",
        "proposal",
        "roi_pool5",
        "fc6",
        "fc7",
        "cls_score",
        "bbox_pred",
        "cls_prob",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect()
}

impl Engine for StubEngine {
    fn set_input(&mut self, index: usize, tensor: &Tensor) -> FrcnnResult<()> {
        if index > 1 {
            return Err(FrcnnError::IndexOutOfBounds {
                index,
                len: 2,
                context: "network input",
            });
        }
        self.inputs.insert(index, tensor.clone());
        Ok(())
    }

    fn forward(&mut self) -> FrcnnResult<f32> {
        self.forward_calls += 1;
        self.blobs.insert("rois".to_owned(), self.initial_rois.clone());
        let stage = self.initial.clone();
        self.publish(stage);
        Ok(0.0)
    }

    fn forward_from(&mut self, layer: usize) -> FrcnnResult<()> {
        self.forward_from_calls.push(layer);
        if let Some(stage) = self.refinements.pop_front() {
            self.publish(stage);
        }
        Ok(())
    }

    fn tensor(&self, name: &str) -> Option<TensorRef<'_>> {
        self.blobs.get(name).map(Tensor::view)
    }

    fn set_tensor(&mut self, name: &str, tensor: &Tensor) -> FrcnnResult<()> {
        if name == "rois" {
            self.written_rois.push(tensor.clone());
        }
        self.blobs.insert(name.to_owned(), tensor.clone());
        Ok(())
    }

    fn layer_names(&self) -> Vec<String> {
        self.layers.clone()
    }
}

/// Solid-colour test image of `width x height` pixels.
pub fn flat_image(width: usize, height: usize) -> Vec<f32> {
    vec![128.0; width * height * 3]
}

/// Zero deltas for `rois` proposals.
pub fn zero_deltas(rois: usize) -> Vec<f32> {
    vec![0.0; rois * NUM_CLASSES * 4]
}

pub fn assert_box_close(actual: frcnn::BBox, expected: [f32; 4]) {
    let got = actual.to_array();
    for (g, e) in got.iter().zip(expected.iter()) {
        assert!((g - e).abs() < 1e-4, "box {got:?} != {expected:?}");
    }
}

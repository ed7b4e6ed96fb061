//! The detector: engine orchestration around decode and suppression.
//!
//! A [`Detector`] is built once per model. Construction validates the
//! configuration and locates the ROI-pooling layer; after that every
//! [`Detector::detect`] call is independent. `detect` borrows the detector
//! mutably because it writes into the engine's input and proposal blobs, so
//! calls on one detector are serialized by construction.

mod config;
mod iterative;
mod outputs;
mod single_pass;

pub use config::{DetectionMode, DetectorConfig, TensorNames};
pub use iterative::ProposalSet;

use std::path::Path;

use crate::engine::{Engine, ModelLoader, IMAGE_INPUT, IM_INFO_INPUT};
use crate::geometry::{BBox, ImageMeta};
use crate::image::resize::resize_bilinear;
use crate::image::{ImageView, CHANNELS};
use crate::preprocess::{build_image_tensor, build_meta_tensor};
use crate::suppress::Detection;
use crate::tensor::Tensor;
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::{FrcnnError, FrcnnResult};
use outputs::NetworkOutputs;

/// Original-image geometry used by the final decode.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DecodeFrame {
    pub(crate) scale_factor: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

/// Two-stage detector post-processing bound to one engine.
pub struct Detector<E> {
    engine: E,
    roi_pool_layer: usize,
    config: DetectorConfig,
}

impl<E: Engine> Detector<E> {
    /// Wraps an already loaded engine.
    ///
    /// Fails if the configuration is invalid or if the engine does not have
    /// exactly one layer whose name starts with the ROI-pooling prefix.
    pub fn new(engine: E, config: DetectorConfig) -> FrcnnResult<Self> {
        config.validate()?;
        let layers = engine.layer_names();
        let roi_pool_layer = find_roi_pool_layer(&layers, &config.names.roi_pool_prefix)?;
        trace_event!(
            "roi_pool_layer",
            index = roi_pool_layer,
            layer = layers[roi_pool_layer].as_str()
        );
        Ok(Self {
            engine,
            roi_pool_layer,
            config,
        })
    }

    /// Builds the engine from `topology` and `weights`, then wraps it.
    ///
    /// The configuration is checked before the model is loaded.
    pub fn load<L>(
        loader: &L,
        topology: &Path,
        weights: &Path,
        config: DetectorConfig,
    ) -> FrcnnResult<Self>
    where
        L: ModelLoader<Engine = E>,
    {
        config.validate()?;
        let engine = loader.load(topology, weights)?;
        Self::new(engine, config)
    }

    /// Index of the ROI-pooling layer found at construction.
    pub fn roi_pool_layer(&self) -> usize {
        self.roi_pool_layer
    }

    /// Active configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Borrows the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Borrows the engine mutably.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Releases the engine.
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Detects objects in one image.
    ///
    /// `image` must be contiguous interleaved 3-channel data in the channel
    /// order the pixel means use. Returned boxes are in the image's own pixel
    /// coordinates, grouped by ascending class and sorted by descending score
    /// within a class. Classes never suppress each other.
    pub fn detect(&mut self, image: ImageView<'_>) -> FrcnnResult<Vec<Detection>> {
        let _span = trace_span!("detect", width = image.width(), height = image.height()).entered();

        if !image.is_contiguous() {
            return Err(FrcnnError::NonContiguousImage {
                stride: image.stride(),
                expected: image.width() * CHANNELS,
            });
        }

        let meta = self.write_inputs(image)?;
        self.engine.forward()?;

        let frame = DecodeFrame {
            scale_factor: meta.scale_factor,
            width: image.width() as f32,
            height: image.height() as f32,
        };
        let detections = match self.config.mode() {
            DetectionMode::SinglePass => {
                let outputs =
                    NetworkOutputs::read(&self.engine, &self.config.names, self.config.num_classes)?;
                let proposals: Vec<BBox> = outputs.rois.iter().collect();
                trace_debug!("network_outputs", proposals = proposals.len());
                single_pass::decode_per_class(&proposals, &outputs.classes, frame, &self.config)
            }
            DetectionMode::Iterative { rounds } => iterative::detect_iterative(
                &mut self.engine,
                self.roi_pool_layer,
                rounds,
                &meta,
                frame,
                &self.config,
            )?,
        };

        trace_event!("detections", count = detections.len());
        Ok(detections)
    }

    /// Resizes `image` for the network, writes the pixel and image-info
    /// inputs, and returns the metadata used.
    fn write_inputs(&mut self, image: ImageView<'_>) -> FrcnnResult<ImageMeta> {
        let meta = ImageMeta::for_image(
            image.width(),
            image.height(),
            self.config.test_scale(),
            self.config.test_max_size,
        );
        trace_event!(
            "image_info",
            height = meta.scaled_height,
            width = meta.scaled_width,
            scale = meta.scale_factor
        );

        let resized = resize_bilinear(image, meta.scaled_width, meta.scaled_height)?;
        let pixels = build_image_tensor(resized.view(), self.config.pixel_means)?;
        self.engine.set_input(IMAGE_INPUT, &pixels)?;
        self.engine
            .set_input(IM_INFO_INPUT, &build_meta_tensor(&meta.im_info())?)?;
        Ok(meta)
    }

    /// Runs a full forward pass on the inputs already written and returns
    /// copies of the named blobs, in the order requested.
    pub fn forward_blobs(&mut self, names: &[&str]) -> FrcnnResult<Vec<Tensor>> {
        let loss = self.engine.forward()?;
        trace_debug!("forward", loss = loss);
        names
            .iter()
            .map(|&name| {
                self.engine
                    .tensor(name)
                    .map(|t| t.to_tensor())
                    .ok_or_else(|| FrcnnError::MissingTensor {
                        name: name.to_owned(),
                    })
            })
            .collect()
    }
}

/// Finds the single layer whose name starts with `prefix`.
pub fn find_roi_pool_layer(layers: &[String], prefix: &str) -> FrcnnResult<usize> {
    let matches: Vec<usize> = layers
        .iter()
        .enumerate()
        .filter(|(_, name)| name.starts_with(prefix))
        .map(|(idx, _)| idx)
        .collect();
    match matches.as_slice() {
        [idx] => Ok(*idx),
        _ => Err(FrcnnError::RoiLayerCount {
            prefix: prefix.to_owned(),
            found: matches.iter().map(|&idx| layers[idx].clone()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::find_roi_pool_layer;
    use crate::util::FrcnnError;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn finds_prefixed_layer() {
        let layers = names(&["data", "conv5_3", "rpn", "roi_pool5", "fc6"]);
        assert_eq!(find_roi_pool_layer(&layers, "roi_pool"), Ok(3));
    }

    #[test]
    fn prefix_must_lead_the_name() {
        let layers = names(&["data", "my_roi_pool", "roi_pool"]);
        assert_eq!(find_roi_pool_layer(&layers, "roi_pool"), Ok(2));
    }

    #[test]
    fn reports_all_candidates() {
        let layers = names(&["roi_pool_a", "fc", "roi_pool_b"]);
        assert_eq!(
            find_roi_pool_layer(&layers, "roi_pool"),
            Err(FrcnnError::RoiLayerCount {
                prefix: "roi_pool".to_owned(),
                found: names(&["roi_pool_a", "roi_pool_b"]),
            })
        );
    }
}

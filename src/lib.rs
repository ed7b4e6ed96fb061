//! Post-processing core for two-stage (Faster R-CNN style) object detectors.
//!
//! Given the proposals, class scores and box deltas produced by a network, this
//! crate decodes class-specific boxes, thresholds and suppresses them per class,
//! and optionally refines the proposals by re-running the ROI head. The network
//! itself stays behind the [`Engine`] trait.

pub mod detector;
pub mod engine;
pub mod geometry;
pub mod image;
pub mod lowlevel;
pub mod preprocess;
mod suppress;
pub mod tensor;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use crate::image::io;

pub use detector::{DetectionMode, Detector, DetectorConfig, ProposalSet, TensorNames};
pub use engine::{Engine, ModelLoader};
pub use geometry::{BBox, ImageMeta, RegressionDelta};
pub use crate::image::{ImageView, OwnedImage};
pub use suppress::{iou, non_max_suppress, Detection};
pub use tensor::{Tensor, TensorRef};
pub use util::{FrcnnError, FrcnnResult};

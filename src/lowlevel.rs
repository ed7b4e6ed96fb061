//! Building blocks for custom post-processing pipelines.
//!
//! These expose the individual decode, threshold and suppression steps that
//! [`Detector`](crate::Detector) chains together. Most users should call
//! `Detector::detect` instead.

pub use crate::detector::find_roi_pool_layer;
pub use crate::engine::{IMAGE_INPUT, IM_INFO_INPUT};
pub use crate::geometry::{clip_to_image, compute_scale_factor, decode_box, scaled_len};
pub use crate::image::resize::resize_bilinear;
pub use crate::preprocess::{build_image_tensor, build_meta_tensor};
pub use crate::suppress::{
    filter_by_score, iou, non_max_suppress, non_max_suppress_above, sort_detections_desc,
};
pub use crate::tensor::{ClassDeltas, ClassScores, RoiTable, ROI_ROW_LEN};

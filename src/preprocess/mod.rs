//! Network input preparation.
//!
//! The engine expects planar `(1, 3, H, W)` pixels with the per-channel mean
//! removed, plus a small `(1, N, 1, 1)` tensor of per-image metadata. This is
//! the only place that transposes interleaved pixels into planes.

use crate::image::{ImageView, CHANNELS};
use crate::tensor::Tensor;
use crate::util::{FrcnnError, FrcnnResult};

/// Builds the planar, mean-subtracted image tensor.
///
/// Plane `c`, row `i`, column `j` holds `image[i, j, c] - mean[c]`. The view
/// must be contiguous; padded rows are rejected with
/// [`FrcnnError::NonContiguousImage`].
pub fn build_image_tensor(image: ImageView<'_>, mean: [f32; CHANNELS]) -> FrcnnResult<Tensor> {
    let (width, height) = (image.width(), image.height());
    if !image.is_contiguous() {
        return Err(FrcnnError::NonContiguousImage {
            stride: image.stride(),
            expected: width * CHANNELS,
        });
    }

    let plane = width * height;
    let mut tensor = Tensor::zeros(vec![1, CHANNELS, height, width])?;
    let out = tensor.data_mut();
    let pixels = &image.as_slice()[..plane * CHANNELS];
    for (idx, px) in pixels.chunks_exact(CHANNELS).enumerate() {
        for c in 0..CHANNELS {
            out[c * plane + idx] = px[c] - mean[c];
        }
    }
    Ok(tensor)
}

/// Builds a `(1, N, 1, 1)` tensor holding `values` in order.
///
/// The detector passes `[scaled_height, scaled_width, scale_factor]`.
pub fn build_meta_tensor(values: &[f32]) -> FrcnnResult<Tensor> {
    Tensor::new(vec![1, values.len(), 1, 1], values.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_tensor_keeps_order() {
        let t = build_meta_tensor(&[600.0, 800.0, 1.6]).unwrap();
        assert_eq!(t.shape(), &[1, 3, 1, 1]);
        assert_eq!(t.data(), &[600.0, 800.0, 1.6]);
    }
}

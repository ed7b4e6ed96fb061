//! Bilinear resizing for network input preparation.
//!
//! Sampling uses half-pixel centres: destination pixel `x` reads the source at
//! `(x + 0.5) * src_w / dst_w - 0.5`, clamped to the valid range. Channels are
//! interpolated independently.

use crate::image::{ImageView, OwnedImage, CHANNELS};
use crate::util::{FrcnnError, FrcnnResult};

/// Source sample position and weights along one axis.
#[derive(Clone, Copy)]
struct Tap {
    i0: usize,
    i1: usize,
    frac: f32,
}

fn axis_taps(src_len: usize, dst_len: usize) -> Vec<Tap> {
    let ratio = src_len as f32 / dst_len as f32;
    let max = (src_len - 1) as f32;
    (0..dst_len)
        .map(|d| {
            let pos = ((d as f32 + 0.5) * ratio - 0.5).clamp(0.0, max);
            let i0 = pos.floor() as usize;
            Tap {
                i0,
                i1: (i0 + 1).min(src_len - 1),
                frac: pos - i0 as f32,
            }
        })
        .collect()
}

/// Resizes `src` to `dst_width x dst_height` with bilinear interpolation.
///
/// Same-size requests return a packed copy of the input.
pub fn resize_bilinear(
    src: ImageView<'_>,
    dst_width: usize,
    dst_height: usize,
) -> FrcnnResult<OwnedImage> {
    if dst_width == 0 || dst_height == 0 {
        return Err(FrcnnError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }
    if dst_width == src.width() && dst_height == src.height() {
        return OwnedImage::from_view(src);
    }

    let xs = axis_taps(src.width(), dst_width);
    let ys = axis_taps(src.height(), dst_height);
    let mut out = Vec::with_capacity(dst_width * dst_height * CHANNELS);

    for ty in &ys {
        let (row0, row1) = match (src.row(ty.i0), src.row(ty.i1)) {
            (Some(r0), Some(r1)) => (r0, r1),
            _ => {
                return Err(FrcnnError::IndexOutOfBounds {
                    index: ty.i1,
                    len: src.height(),
                    context: "image row",
                })
            }
        };
        for tx in &xs {
            let a = tx.i0 * CHANNELS;
            let b = tx.i1 * CHANNELS;
            for c in 0..CHANNELS {
                let top = row0[a + c] + (row0[b + c] - row0[a + c]) * tx.frac;
                let bottom = row1[a + c] + (row1[b + c] - row1[a + c]) * tx.frac;
                out.push(top + (bottom - top) * ty.frac);
            }
        }
    }

    OwnedImage::new(out, dst_width, dst_height)
}

//! Box geometry for detector post-processing.
//!
//! Boxes use inclusive pixel coordinates: a box from `x1 = 0` to `x2 = 9` is
//! ten pixels wide. All helpers here are pure functions.

pub mod scale;
pub mod transform;

pub use scale::{compute_scale_factor, scaled_len};
pub use transform::{clip_to_image, decode_box};

/// Axis-aligned box `(x1, y1, x2, y2)` in pixel space.
///
/// `x1 <= x2` and `y1 <= y2` hold after clipping; decoded boxes may violate it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    /// Creates a box from its corners.
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Inclusive width, `x2 - x1 + 1`.
    pub fn width(&self) -> f32 {
        self.x2 - self.x1 + 1.0
    }

    /// Inclusive height, `y2 - y1 + 1`.
    pub fn height(&self) -> f32 {
        self.y2 - self.y1 + 1.0
    }

    /// Inclusive area.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Divides every coordinate by `scale`, mapping network-input pixels back
    /// to original-image pixels.
    pub fn unscaled(&self, scale: f32) -> Self {
        Self::new(
            self.x1 / scale,
            self.y1 / scale,
            self.x2 / scale,
            self.y2 / scale,
        )
    }

    /// Corners as `[x1, y1, x2, y2]`.
    pub fn to_array(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Predicted offset `(dx, dy, dw, dh)` from a proposal to a refined box.
///
/// `dx`/`dy` are centre shifts relative to the proposal size; `dw`/`dh` are
/// log-space size ratios.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RegressionDelta {
    pub dx: f32,
    pub dy: f32,
    pub dw: f32,
    pub dh: f32,
}

impl RegressionDelta {
    /// Creates a delta.
    pub const fn new(dx: f32, dy: f32, dw: f32, dh: f32) -> Self {
        Self { dx, dy, dw, dh }
    }
}

/// Per-image structural metadata fed to the network alongside the pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageMeta {
    /// Height of the resized network input.
    pub scaled_height: usize,
    /// Width of the resized network input.
    pub scaled_width: usize,
    /// Factor applied to the original image.
    pub scale_factor: f32,
}

impl ImageMeta {
    /// Derives the resized dimensions for an image of `width x height`.
    pub fn for_image(width: usize, height: usize, target_short_side: f32, max_long_side: f32) -> Self {
        let scale_factor = compute_scale_factor(width, height, target_short_side, max_long_side);
        Self {
            scaled_height: scaled_len(height, scale_factor),
            scaled_width: scaled_len(width, scale_factor),
            scale_factor,
        }
    }

    /// Values for the image-info input: height, width, scale, in that order.
    pub fn im_info(&self) -> [f32; 3] {
        [
            self.scaled_height as f32,
            self.scaled_width as f32,
            self.scale_factor,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inclusive_extent() {
        let b = BBox::new(0.0, 0.0, 9.0, 4.0);
        assert_eq!(b.width(), 10.0);
        assert_eq!(b.height(), 5.0);
        assert_eq!(b.area(), 50.0);
    }

    #[test]
    fn image_meta_orders_height_first() {
        let meta = ImageMeta::for_image(40, 30, 60.0, 100.0);
        assert_eq!(meta.scaled_width, 80);
        assert_eq!(meta.scaled_height, 60);
        assert_eq!(meta.im_info(), [60.0, 80.0, 2.0]);
    }
}

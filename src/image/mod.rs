//! Three-channel float image buffers.
//!
//! `ImageView` borrows interleaved pixels (`[c0, c1, c2]` per pixel) with an
//! explicit row stride counted in elements. A stride larger than `3 * width`
//! describes padded rows; such views can be inspected and resized but the
//! engine input writer requires contiguous storage.

use crate::util::{FrcnnError, FrcnnResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod resize;

/// Number of interleaved channels per pixel.
pub const CHANNELS: usize = 3;

/// Borrowed interleaved 3-channel `f32` image.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> ImageView<'a> {
    /// Creates a contiguous view with `stride == 3 * width`.
    pub fn from_slice(data: &'a [f32], width: usize, height: usize) -> FrcnnResult<Self> {
        Self::new(data, width, height, width.saturating_mul(CHANNELS))
    }

    /// Creates a view with an explicit row stride in elements.
    pub fn new(data: &'a [f32], width: usize, height: usize, stride: usize) -> FrcnnResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(FrcnnError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Elements between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns true when rows are packed back to back.
    pub fn is_contiguous(&self) -> bool {
        self.stride == self.width * CHANNELS
    }

    /// Backing slice, including any row padding.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Interleaved pixels of row `y`, `3 * width` elements long.
    pub fn row(&self, y: usize) -> Option<&'a [f32]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * CHANNELS)?;
        self.data.get(start..end)
    }

    /// Pixel at `(x, y)` if in bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[f32; CHANNELS]> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let p = &row[x * CHANNELS..(x + 1) * CHANNELS];
        Some([p[0], p[1], p[2]])
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> FrcnnResult<usize> {
    if width == 0 || height == 0 {
        return Err(FrcnnError::InvalidDimensions { width, height });
    }
    let row_len = width
        .checked_mul(CHANNELS)
        .ok_or(FrcnnError::InvalidDimensions { width, height })?;
    if stride < row_len {
        return Err(FrcnnError::InvalidStride {
            width: row_len,
            stride,
        });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_len))
        .ok_or(FrcnnError::InvalidDimensions { width, height })
}

/// Owned contiguous 3-channel `f32` image.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Wraps an interleaved buffer of exactly `3 * width * height` values.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> FrcnnResult<Self> {
        let needed = required_len(width, height, width.saturating_mul(CHANNELS))?;
        if data.len() != needed {
            return Err(FrcnnError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Converts 8-bit interleaved pixels to floats without rescaling.
    pub fn from_u8(data: &[u8], width: usize, height: usize) -> FrcnnResult<Self> {
        Self::new(data.iter().map(|&v| f32::from(v)).collect(), width, height)
    }

    /// Copies a possibly strided view into packed storage.
    pub fn from_view(view: ImageView<'_>) -> FrcnnResult<Self> {
        let row_len = view.width() * CHANNELS;
        let mut data = Vec::with_capacity(row_len * view.height());
        for y in 0..view.height() {
            let row = view.row(y).ok_or(FrcnnError::IndexOutOfBounds {
                index: y,
                len: view.height(),
                context: "image row",
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, view.width(), view.height())
    }

    /// Borrowed view of the image.
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width * CHANNELS,
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Interleaved pixel data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

//! Tensors exchanged with the inference engine.
//!
//! `Tensor` is an owned shape plus contiguous `f32` storage, used for inputs the
//! detector writes. `TensorRef` is the borrowed form an engine hands out for its
//! named blobs. The typed views (`RoiTable`, `ClassScores`, `ClassDeltas`)
//! check the layout of the three detector outputs once, so the decode loops
//! can index without further validation.

use crate::geometry::{BBox, RegressionDelta};
use crate::util::{FrcnnError, FrcnnResult};

/// Owned tensor with row-major contiguous storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Creates a tensor, checking that `data` holds exactly `prod(shape)` elements.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> FrcnnResult<Self> {
        let needed = element_count(&shape)?;
        if data.len() != needed {
            return Err(FrcnnError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates a zero-filled tensor.
    pub fn zeros(shape: Vec<usize>) -> FrcnnResult<Self> {
        let len = element_count(&shape)?;
        Ok(Self {
            shape,
            data: vec![0.0; len],
        })
    }

    /// Returns the tensor shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the flat storage.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the flat storage mutably.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Borrows the tensor.
    pub fn view(&self) -> TensorRef<'_> {
        TensorRef {
            shape: &self.shape,
            data: &self.data,
        }
    }

    /// Consumes the tensor and returns its storage.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}

fn element_count(shape: &[usize]) -> FrcnnResult<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or(FrcnnError::InvalidDimensions {
            width: shape.last().copied().unwrap_or(0),
            height: shape.first().copied().unwrap_or(0),
        })
}

/// Borrowed tensor as exposed by an engine.
#[derive(Clone, Copy, Debug)]
pub struct TensorRef<'a> {
    /// Dimensions, outermost first.
    pub shape: &'a [usize],
    /// Contiguous storage.
    pub data: &'a [f32],
}

impl<'a> TensorRef<'a> {
    /// Size of the leading (batch/proposal) axis.
    pub fn num(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Size of the second axis.
    pub fn channels(&self) -> usize {
        self.shape.get(1).copied().unwrap_or(1)
    }

    /// Copies into an owned tensor.
    pub fn to_tensor(&self) -> Tensor {
        Tensor {
            shape: self.shape.to_vec(),
            data: self.data.to_vec(),
        }
    }

    fn require_rank(&self, name: &str, expected: usize) -> FrcnnResult<()> {
        if self.shape.len() < expected {
            return Err(FrcnnError::TensorRank {
                name: name.to_owned(),
                rank: self.shape.len(),
                expected,
            });
        }
        Ok(())
    }

    /// Flattens the non-leading axes, checking the storage length matches.
    fn rows(&self, name: &str) -> FrcnnResult<(usize, usize)> {
        self.require_rank(name, 2)?;
        let num = self.num();
        let per_row = element_count(&self.shape[1..])?;
        let expected = num
            .checked_mul(per_row)
            .ok_or(FrcnnError::InvalidDimensions {
                width: per_row,
                height: num,
            })?;
        if self.data.len() != expected {
            return Err(FrcnnError::TensorSize {
                name: name.to_owned(),
                expected,
                got: self.data.len(),
            });
        }
        Ok((num, per_row))
    }
}

/// Number of values per proposal row: batch index followed by a box.
pub const ROI_ROW_LEN: usize = 5;

/// Region proposals stored as `[batch, x1, y1, x2, y2]` rows.
#[derive(Clone, Copy, Debug)]
pub struct RoiTable<'a> {
    data: &'a [f32],
    len: usize,
}

impl<'a> RoiTable<'a> {
    /// Validates an `(N, 5, ...)` proposal tensor.
    ///
    /// Every batch index must be exactly zero; any other value, NaN included,
    /// is reported with the first offending row.
    pub fn from_tensor(name: &str, tensor: TensorRef<'a>) -> FrcnnResult<Self> {
        let (len, per_row) = tensor.rows(name)?;
        if per_row != ROI_ROW_LEN {
            return Err(FrcnnError::TensorSize {
                name: name.to_owned(),
                expected: len * ROI_ROW_LEN,
                got: tensor.data.len(),
            });
        }
        // `!= 0.0` also catches NaN.
        if let Some((row, index)) = tensor
            .data
            .chunks_exact(ROI_ROW_LEN)
            .map(|row| row[0])
            .enumerate()
            .find(|&(_, index)| index != 0.0)
        {
            return Err(FrcnnError::BatchSize { row, index });
        }
        Ok(Self {
            data: tensor.data,
            len,
        })
    }

    /// Number of proposals.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when the network produced no proposals.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Proposal `i` at the network's input scale.
    pub fn bbox(&self, i: usize) -> BBox {
        let row = &self.data[i * ROI_ROW_LEN..(i + 1) * ROI_ROW_LEN];
        BBox::new(row[1], row[2], row[3], row[4])
    }

    /// Iterates over all proposal boxes.
    pub fn iter(&self) -> impl Iterator<Item = BBox> + 'a {
        self.data
            .chunks_exact(ROI_ROW_LEN)
            .map(|row| BBox::new(row[1], row[2], row[3], row[4]))
    }
}

/// Per-proposal, per-class confidence matrix (N × C).
#[derive(Clone, Copy, Debug)]
pub struct ClassScores<'a> {
    data: &'a [f32],
    num_rois: usize,
    num_classes: usize,
}

impl<'a> ClassScores<'a> {
    /// Validates an `(N, C, ...)` score tensor.
    pub fn from_tensor(name: &str, tensor: TensorRef<'a>) -> FrcnnResult<Self> {
        let (num_rois, num_classes) = tensor.rows(name)?;
        Ok(Self {
            data: tensor.data,
            num_rois,
            num_classes,
        })
    }

    /// Wraps a row-major slice; used by tests and custom pipelines.
    pub fn from_slice(data: &'a [f32], num_rois: usize, num_classes: usize) -> FrcnnResult<Self> {
        let expected = num_rois * num_classes;
        if data.len() != expected {
            return Err(FrcnnError::BufferTooSmall {
                needed: expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            num_rois,
            num_classes,
        })
    }

    /// Number of proposals (rows).
    pub fn num_rois(&self) -> usize {
        self.num_rois
    }

    /// Number of classes including background (columns).
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Score of class `class` for proposal `roi`.
    pub fn get(&self, roi: usize, class: usize) -> f32 {
        self.data[roi * self.num_classes + class]
    }

    /// Highest-scoring non-background class for proposal `roi`.
    ///
    /// Scans classes `1..C` with `>=`, so among equal maxima the last one wins.
    /// Returns 1 when the matrix has no foreground column to compare.
    pub fn best_foreground_class(&self, roi: usize) -> usize {
        let mut best = 1;
        for class in 1..self.num_classes {
            if self.get(roi, class) >= self.get(roi, best) {
                best = class;
            }
        }
        best
    }
}

/// Per-proposal, per-class regression deltas (N × 4C).
#[derive(Clone, Copy, Debug)]
pub struct ClassDeltas<'a> {
    data: &'a [f32],
    num_rois: usize,
    num_classes: usize,
}

impl<'a> ClassDeltas<'a> {
    /// Validates an `(N, 4C, ...)` delta tensor against `num_classes`.
    pub fn from_tensor(name: &str, tensor: TensorRef<'a>, num_classes: usize) -> FrcnnResult<Self> {
        let (num_rois, per_row) = tensor.rows(name)?;
        if per_row != num_classes * 4 {
            return Err(FrcnnError::TensorSize {
                name: name.to_owned(),
                expected: num_rois * num_classes * 4,
                got: tensor.data.len(),
            });
        }
        Ok(Self {
            data: tensor.data,
            num_rois,
            num_classes,
        })
    }

    /// Number of proposals (rows).
    pub fn num_rois(&self) -> usize {
        self.num_rois
    }

    /// Delta predicted for class `class` of proposal `roi`.
    pub fn get(&self, roi: usize, class: usize) -> RegressionDelta {
        let start = (roi * self.num_classes + class) * 4;
        let d = &self.data[start..start + 4];
        RegressionDelta::new(d[0], d[1], d[2], d[3])
    }
}

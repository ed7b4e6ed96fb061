//! Error types for frcnn.

use thiserror::Error;

/// Result alias for frcnn operations.
pub type FrcnnResult<T> = std::result::Result<T, FrcnnError>;

/// Errors raised while configuring the detector or post-processing its outputs.
///
/// Every variant that comes from a failed check carries the observed value
/// and, where one exists, the expected value.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FrcnnError {
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than one row of pixels.
    #[error("invalid stride {stride} for row of {width} elements")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the requested shape.
    #[error("buffer too small: need {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Image rows are padded; the engine needs contiguous row-major storage.
    #[error("image is not contiguous: row stride {stride}, expected {expected}")]
    NonContiguousImage { stride: usize, expected: usize },
    /// More (or fewer) than one test scale configured.
    #[error("exactly one test scale is supported, got {count}")]
    MultiScale { count: usize },
    /// Scale target or max size is not a positive finite number.
    #[error("invalid {name}: {value}")]
    InvalidScale { name: &'static str, value: f32 },
    /// Iterative mode needs at least one round.
    #[error("iterative rounds must be >= 1 or disabled, got {rounds}")]
    InvalidIterativeRounds { rounds: usize },
    /// The class count must include background plus at least one object class.
    #[error("num_classes must be >= 2 (background + objects), got {num_classes}")]
    InvalidClassCount { num_classes: usize },
    /// A score or IoU threshold is NaN or infinite.
    #[error("invalid {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f32 },
    /// Zero or several layers match the ROI-pooling prefix.
    #[error("expected exactly one layer named `{prefix}*`, found {}: {found:?}", found.len())]
    RoiLayerCount { prefix: String, found: Vec<String> },
    /// The engine does not expose a tensor with this name.
    #[error("tensor `{name}` not found")]
    MissingTensor { name: String },
    /// The tensor has too few axes for its role.
    #[error("tensor `{name}` has rank {rank}, expected at least {expected}")]
    TensorRank {
        name: String,
        rank: usize,
        expected: usize,
    },
    /// Element count of a tensor does not match its role.
    #[error("tensor `{name}` has {got} elements, expected {expected}")]
    TensorSize {
        name: String,
        expected: usize,
        got: usize,
    },
    /// Network output class count disagrees with the configuration.
    #[error("network reports {got} classes, configuration expects {expected}")]
    ClassCountMismatch { expected: usize, got: usize },
    /// Output tensors disagree on the number of proposals.
    #[error("tensor `{name}` holds {got} proposals, expected {expected}")]
    ProposalCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    /// A proposal row carries a batch index other than 0.
    #[error("only single-image batches are supported, proposal {row} has batch index {index}")]
    BatchSize { row: usize, index: f32 },
    /// An index is out of bounds for a container.
    #[error("index {index} out of bounds for {context} (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// The inference engine failed.
    #[error("engine error: {reason}")]
    Engine { reason: String },
    /// Image loading failed (requires `image-io`).
    #[error("image I/O error: {reason}")]
    ImageIo { reason: String },
}

//! The inference-engine seam.
//!
//! The detector needs very little from the network runtime: write inputs, run
//! a whole or partial forward pass, read and overwrite named blobs, and list
//! layer names. Anything implementing [`Engine`] can drive a [`Detector`],
//! including test stubs that replay canned outputs.
//!
//! [`Detector`]: crate::Detector

use std::path::Path;

use crate::tensor::{Tensor, TensorRef};
use crate::util::FrcnnResult;

/// Index of the image input.
pub const IMAGE_INPUT: usize = 0;
/// Index of the image-info input.
pub const IM_INFO_INPUT: usize = 1;

/// Minimal interface over a network runtime.
///
/// Blobs returned by [`Engine::tensor`] are owned by the engine and are
/// overwritten by every forward call.
pub trait Engine {
    /// Reshapes input `index` to `tensor.shape()` and copies its data in.
    fn set_input(&mut self, index: usize, tensor: &Tensor) -> FrcnnResult<()>;

    /// Runs the whole network and returns the loss it reports.
    fn forward(&mut self) -> FrcnnResult<f32>;

    /// Re-runs the network from layer `layer` onwards, reusing the blobs
    /// computed upstream of it.
    fn forward_from(&mut self, layer: usize) -> FrcnnResult<()>;

    /// Looks up a blob by name.
    fn tensor(&self, name: &str) -> Option<TensorRef<'_>>;

    /// Reshapes blob `name` and overwrites it with `tensor`.
    fn set_tensor(&mut self, name: &str, tensor: &Tensor) -> FrcnnResult<()>;

    /// Layer names in execution order.
    fn layer_names(&self) -> Vec<String>;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn set_input(&mut self, index: usize, tensor: &Tensor) -> FrcnnResult<()> {
        (**self).set_input(index, tensor)
    }

    fn forward(&mut self) -> FrcnnResult<f32> {
        (**self).forward()
    }

    fn forward_from(&mut self, layer: usize) -> FrcnnResult<()> {
        (**self).forward_from(layer)
    }

    fn tensor(&self, name: &str) -> Option<TensorRef<'_>> {
        (**self).tensor(name)
    }

    fn set_tensor(&mut self, name: &str, tensor: &Tensor) -> FrcnnResult<()> {
        (**self).set_tensor(name, tensor)
    }

    fn layer_names(&self) -> Vec<String> {
        (**self).layer_names()
    }
}

/// Builds an engine from a network topology and trained weights.
pub trait ModelLoader {
    /// Engine type produced by this loader.
    type Engine: Engine;

    /// Loads `topology` and copies the trained layers from `weights`.
    fn load(&self, topology: &Path, weights: &Path) -> FrcnnResult<Self::Engine>;
}

//! Gradient function trait

use crate::dtype::Element;
use crate::error::Result;
use crate::tensor::{Tensor, TensorId};
use std::sync::Arc;

/// Trait for computing gradients during the backward pass
///
/// Each signature-family operation recorded on a [`Var`](super::Var) owns a
/// `GradFn` holding what its backward kernel needs: saved inputs and outputs
/// plus the shared basis tables.
pub trait GradFn<T: Element>: Send + Sync {
    /// Gradients for each input given the gradient of the output
    ///
    /// One entry per input; `None` means that input gets no gradient.
    fn backward(&self, grad_output: &Tensor<T>) -> Result<Vec<Option<Tensor<T>>>>;

    /// IDs of the input tensors, used for topological sorting
    fn inputs(&self) -> &[TensorId];

    /// Grad functions of the inputs, `None` for leaves
    fn input_grad_fns(&self) -> Vec<Option<Arc<dyn GradFn<T>>>> {
        vec![None; self.inputs().len()]
    }

    /// Tensors saved during the forward pass
    fn saved_tensors(&self) -> &[Tensor<T>] {
        &[]
    }

    /// Human-readable name for debugging
    fn name(&self) -> &'static str;
}

//! Variable: tensor with gradient tracking

use super::GradFn;
use crate::dtype::Element;
use crate::tensor::{Tensor, TensorId};
use std::sync::Arc;

/// A tensor that records how it was produced
///
/// Leaves share the ID of their tensor, so the gradient of a leaf built from
/// `t` is found in the [`GradStore`](super::GradStore) under `t.id()`.
pub struct Var<T: Element> {
    tensor: Tensor<T>,
    id: TensorId,
    requires_grad: bool,
    /// `None` for leaves
    grad_fn: Option<Arc<dyn GradFn<T>>>,
}

impl<T: Element> Var<T> {
    /// Create a leaf variable
    pub fn new(tensor: Tensor<T>, requires_grad: bool) -> Self {
        Self {
            id: tensor.id(),
            tensor,
            requires_grad,
            grad_fn: None,
        }
    }

    /// Create from an operation result with its gradient function
    pub fn from_op(tensor: Tensor<T>, grad_fn: Arc<dyn GradFn<T>>) -> Self {
        Self {
            id: TensorId::new(),
            tensor,
            requires_grad: true,
            grad_fn: Some(grad_fn),
        }
    }

    /// Graph ID
    #[inline]
    pub fn id(&self) -> TensorId {
        self.id
    }

    /// The underlying tensor
    #[inline]
    pub fn tensor(&self) -> &Tensor<T> {
        &self.tensor
    }

    /// Whether gradients flow to this variable
    #[inline]
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Gradient function, if this is not a leaf
    #[inline]
    pub fn grad_fn(&self) -> Option<&Arc<dyn GradFn<T>>> {
        self.grad_fn.as_ref()
    }

    /// A new leaf with the same data that tracks nothing
    pub fn detach(&self) -> Self {
        Self {
            tensor: self.tensor.clone(),
            id: TensorId::new(),
            requires_grad: false,
            grad_fn: None,
        }
    }

    /// Shape of the underlying tensor
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.tensor.shape()
    }

    /// Number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.tensor.numel()
    }
}

impl<T: Element> Clone for Var<T> {
    fn clone(&self) -> Self {
        Self {
            tensor: self.tensor.clone(),
            id: self.id,
            requires_grad: self.requires_grad,
            grad_fn: self.grad_fn.clone(),
        }
    }
}

impl<T: Element> std::fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Var")
            .field("id", &self.id)
            .field("shape", &self.tensor.shape())
            .field("requires_grad", &self.requires_grad)
            .field("grad_fn", &self.grad_fn.as_ref().map(|g| g.name()))
            .finish()
    }
}

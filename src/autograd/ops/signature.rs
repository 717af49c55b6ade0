//! Backward for path signatures and Chen products

use crate::autograd::GradFn;
use crate::basis::WordIndexer;
use crate::dtype::Element;
use crate::error::Result;
use crate::signature::{
    Basepoint, SignatureOptions, combine_backward_with, signature_backward_with,
};
use crate::tensor::{Tensor, TensorId};
use std::sync::Arc;

/// Backward for `sig = signature(path)`
///
/// Inputs are the path and, with [`Basepoint::Custom`], the basepoint tensor
/// (treated as a leaf). Saved tensors are `[path, sig]`.
pub struct SignatureBackward<T: Element> {
    input_ids: Vec<TensorId>,
    input_grad_fns: Vec<Option<Arc<dyn GradFn<T>>>>,
    /// The path may be untracked while the basepoint still wants a gradient
    path_requires_grad: bool,
    words: Arc<WordIndexer>,
    options: SignatureOptions<T>,
    saved: [Tensor<T>; 2],
}

impl<T: Element> SignatureBackward<T> {
    /// Record a signature computed from `path` with `options`
    pub fn new(
        path_id: TensorId,
        path_grad_fn: Option<Arc<dyn GradFn<T>>>,
        path_requires_grad: bool,
        words: Arc<WordIndexer>,
        options: SignatureOptions<T>,
        path: Tensor<T>,
        output: Tensor<T>,
    ) -> Self {
        let mut input_ids = vec![path_id];
        let mut input_grad_fns = vec![path_grad_fn];
        if let Basepoint::Custom(point) = &options.basepoint {
            input_ids.push(point.id());
            input_grad_fns.push(None);
        }
        Self {
            input_ids,
            input_grad_fns,
            path_requires_grad,
            words,
            options,
            saved: [path, output],
        }
    }
}

impl<T: Element> GradFn<T> for SignatureBackward<T> {
    fn backward(&self, grad_output: &Tensor<T>) -> Result<Vec<Option<Tensor<T>>>> {
        let [path, output] = &self.saved;
        let grads = signature_backward_with(&self.words, grad_output, path, output, &self.options)?;
        let mut out = vec![self.path_requires_grad.then_some(grads.path)];
        if self.input_ids.len() > 1 {
            out.push(grads.basepoint);
        }
        Ok(out)
    }

    fn inputs(&self) -> &[TensorId] {
        &self.input_ids
    }

    fn input_grad_fns(&self) -> Vec<Option<Arc<dyn GradFn<T>>>> {
        self.input_grad_fns.clone()
    }

    fn saved_tensors(&self) -> &[Tensor<T>] {
        &self.saved
    }

    fn name(&self) -> &'static str {
        "SignatureBackward"
    }
}

/// Backward for `out = sig1 ⊗ sig2` (or `sig2 ⊗ sig1` with `inverse`)
pub struct CombineBackward<T: Element> {
    input_ids: [TensorId; 2],
    input_grad_fns: [Option<Arc<dyn GradFn<T>>>; 2],
    /// Which operands asked for a gradient
    needs_grad: [bool; 2],
    words: Arc<WordIndexer>,
    inverse: bool,
    saved: [Tensor<T>; 2],
}

impl<T: Element> CombineBackward<T> {
    /// Record a combine of `sig1` and `sig2`
    pub fn new(
        ids: [TensorId; 2],
        grad_fns: [Option<Arc<dyn GradFn<T>>>; 2],
        needs_grad: [bool; 2],
        words: Arc<WordIndexer>,
        inverse: bool,
        sig1: Tensor<T>,
        sig2: Tensor<T>,
    ) -> Self {
        Self {
            input_ids: ids,
            input_grad_fns: grad_fns,
            needs_grad,
            words,
            inverse,
            saved: [sig1, sig2],
        }
    }
}

impl<T: Element> GradFn<T> for CombineBackward<T> {
    fn backward(&self, grad_output: &Tensor<T>) -> Result<Vec<Option<Tensor<T>>>> {
        let [sig1, sig2] = &self.saved;
        let (g1, g2) = combine_backward_with(&self.words, grad_output, sig1, sig2, self.inverse)?;
        let [need1, need2] = self.needs_grad;
        Ok(vec![need1.then_some(g1), need2.then_some(g2)])
    }

    fn inputs(&self) -> &[TensorId] {
        &self.input_ids
    }

    fn input_grad_fns(&self) -> Vec<Option<Arc<dyn GradFn<T>>>> {
        self.input_grad_fns.to_vec()
    }

    fn saved_tensors(&self) -> &[Tensor<T>] {
        &self.saved
    }

    fn name(&self) -> &'static str {
        "CombineBackward"
    }
}

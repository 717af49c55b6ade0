//! Backward for the signature to log-signature map

use crate::autograd::GradFn;
use crate::dtype::Element;
use crate::error::Result;
use crate::logsignature::LogSignatureReducer;
use crate::tensor::{Tensor, TensorId};
use std::sync::Arc;

/// Backward for `logsig = reduce(sig)`; saves the input signature
pub struct SignatureToLogSignatureBackward<T: Element> {
    input_ids: [TensorId; 1],
    input_grad_fns: [Option<Arc<dyn GradFn<T>>>; 1],
    reducer: LogSignatureReducer,
    saved: [Tensor<T>; 1],
}

impl<T: Element> SignatureToLogSignatureBackward<T> {
    /// Record a reduction of `signature`
    pub fn new(
        signature_id: TensorId,
        signature_grad_fn: Option<Arc<dyn GradFn<T>>>,
        reducer: LogSignatureReducer,
        signature: Tensor<T>,
    ) -> Self {
        Self {
            input_ids: [signature_id],
            input_grad_fns: [signature_grad_fn],
            reducer,
            saved: [signature],
        }
    }
}

impl<T: Element> GradFn<T> for SignatureToLogSignatureBackward<T> {
    fn backward(&self, grad_output: &Tensor<T>) -> Result<Vec<Option<Tensor<T>>>> {
        let grad = self.reducer.reduce_backward(grad_output, &self.saved[0])?;
        Ok(vec![Some(grad)])
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
        "SignatureToLogSignatureBackward"
    }
}

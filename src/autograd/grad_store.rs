//! Gradient storage and accumulation

use crate::dtype::Element;
use crate::error::Result;
use crate::tensor::{Tensor, TensorId};
use std::collections::HashMap;

/// Gradients computed by [`backward`](super::backward), keyed by tensor ID
///
/// A tensor reached along several paths of the graph gets the sum of the
/// contributions.
#[derive(Debug, Clone)]
pub struct GradStore<T: Element> {
    grads: HashMap<TensorId, Tensor<T>>,
}

impl<T: Element> GradStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            grads: HashMap::new(),
        }
    }

    /// Gradient for a tensor, if one reached it
    pub fn get(&self, id: TensorId) -> Option<&Tensor<T>> {
        self.grads.get(&id)
    }

    /// Insert a gradient, replacing any previous one
    pub fn insert(&mut self, id: TensorId, grad: Tensor<T>) {
        self.grads.insert(id, grad);
    }

    /// Whether a gradient exists for `id`
    pub fn contains(&self, id: TensorId) -> bool {
        self.grads.contains_key(&id)
    }

    /// Remove and return a gradient
    pub fn remove(&mut self, id: TensorId) -> Option<Tensor<T>> {
        self.grads.remove(&id)
    }

    /// IDs with a stored gradient
    pub fn keys(&self) -> impl Iterator<Item = &TensorId> {
        self.grads.keys()
    }

    /// Number of stored gradients
    pub fn len(&self) -> usize {
        self.grads.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }

    /// Drop every gradient
    pub fn clear(&mut self) {
        self.grads.clear();
    }

    /// Add `grad` to the gradient of `id`, storing it if there is none yet
    ///
    /// Fails with `ShapeMismatch` if an existing gradient has another shape.
    pub fn accumulate(&mut self, id: TensorId, grad: Tensor<T>) -> Result<()> {
        let merged = match self.grads.get(&id) {
            Some(existing) => existing.add(&grad)?,
            None => grad,
        };
        self.grads.insert(id, merged);
        Ok(())
    }
}

impl<T: Element> Default for GradStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_sums() {
        let mut store = GradStore::<f64>::new();
        let id = TensorId::new();
        store.accumulate(id, Tensor::from_slice(&[1.0, 2.0], &[2])).unwrap();
        store.accumulate(id, Tensor::from_slice(&[0.5, -1.0], &[2])).unwrap();
        assert_eq!(store.get(id).unwrap().to_vec(), vec![1.5, 1.0]);
        assert!(store.accumulate(id, Tensor::zeros(&[3])).is_err());
        assert_eq!(store.get(id).unwrap().to_vec(), vec![1.5, 1.0]);
    }
}

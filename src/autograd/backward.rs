//! Backward pass implementation
//!
//! Reverse-mode traversal of the recorded graph: nodes are sorted so every
//! node comes after its inputs, then visited from the root back to the
//! leaves, handing each `GradFn` the gradient accumulated for its output.

use super::{GradFn, GradStore, Var};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tensor::{Tensor, TensorId};
use std::collections::HashSet;
use std::sync::Arc;

/// Propagate `seed` (the gradient of some loss with respect to `root`) back
/// through the graph
///
/// The returned store holds a gradient for every variable reached, including
/// `root` itself (equal to `seed`). Leaves are found under their tensor ID.
///
/// # Example
///
/// ```
/// use sigr::autograd::{Var, backward, var_signature};
/// use sigr::basis::BasisRegistry;
/// use sigr::signature::SignatureOptions;
/// use sigr::tensor::Tensor;
///
/// let registry = BasisRegistry::new();
/// let path = Var::new(
///     Tensor::<f64>::from_slice(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0], &[1, 3, 2]),
///     true,
/// );
/// let sig = var_signature(&registry, &path, 2, &SignatureOptions::new())?;
/// let mut seed = vec![0.0; 6];
/// seed[0] = 1.0; // d/dpath of the level-1 coefficient of letter 0
/// let grads = backward(&sig, Tensor::from_slice(&seed, &[1, 6]))?;
/// let grad = grads.get(path.id()).unwrap();
/// assert_eq!(grad.as_slice(), &[-1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
/// # Ok::<(), sigr::error::Error>(())
/// ```
pub fn backward<T: Element>(root: &Var<T>, seed: Tensor<T>) -> Result<GradStore<T>> {
    seed.expect_shape(root.shape())?;
    if !root.requires_grad() {
        return Err(Error::invalid_argument(
            "root",
            "backward called on a variable that does not require grad",
        ));
    }

    let mut grad_store = GradStore::new();
    grad_store.insert(root.id(), seed);

    let order = topological_sort(root);
    tracing::trace!(nodes = order.len(), "running backward pass");
    for (id, grad_fn, input_ids) in order.into_iter().rev() {
        let Some(grad_fn) = grad_fn else { continue };
        let Some(grad_output) = grad_store.get(id).cloned() else {
            continue;
        };
        let input_grads = grad_fn.backward(&grad_output)?;
        for (input_id, input_grad) in input_ids.iter().zip(input_grads) {
            if let Some(input_grad) = input_grad {
                grad_store.accumulate(*input_id, input_grad)?;
            }
        }
    }
    Ok(grad_store)
}

/// (node id, grad fn, input ids)
type TopoEntry<T> = (TensorId, Option<Arc<dyn GradFn<T>>>, Vec<TensorId>);

/// DFS post-order: inputs before outputs
fn topological_sort<T: Element>(root: &Var<T>) -> Vec<TopoEntry<T>> {
    fn dfs<T: Element>(
        id: TensorId,
        grad_fn: Option<Arc<dyn GradFn<T>>>,
        visited: &mut HashSet<TensorId>,
        result: &mut Vec<TopoEntry<T>>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let input_ids: Vec<TensorId> = grad_fn
            .as_ref()
            .map(|gf| gf.inputs().to_vec())
            .unwrap_or_default();
        if let Some(gf) = &grad_fn {
            for (input_id, input_grad_fn) in input_ids.iter().zip(gf.input_grad_fns()) {
                dfs(*input_id, input_grad_fn, visited, result);
            }
        }
        result.push((id, grad_fn, input_ids));
    }

    let mut result = Vec::new();
    let mut visited = HashSet::new();
    dfs(root.id(), root.grad_fn().cloned(), &mut visited, &mut result);
    result
}

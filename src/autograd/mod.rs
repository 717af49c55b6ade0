//! Automatic differentiation (autograd)
//!
//! Reverse-mode differentiation through signature-family operations. Wrap
//! inputs in [`Var`], build outputs with the `var_*` functions, then call
//! [`backward`] with the gradient of a loss with respect to the final output.
//! The kernels themselves are the exact adjoints from
//! [`signature_backward`](crate::signature::signature_backward) and friends;
//! this module only records which one to call and in what order.

mod backward;
mod grad_fn;
mod grad_store;
mod var;
mod var_ops;

pub mod ops;

pub use backward::backward;
pub use grad_fn::GradFn;
pub use grad_store::GradStore;
pub use var::Var;
pub use var_ops::{
    var_logsignature, var_signature, var_signature_combine, var_signature_to_logsignature,
};

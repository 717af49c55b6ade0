//! Backward implementations for the signature family
//!
//! Each `*Backward` struct is the [`GradFn`](super::GradFn) recorded by the
//! matching `var_*` function in [`var_ops`](super::var_ops).

mod logsignature;
mod signature;

pub use logsignature::SignatureToLogSignatureBackward;
pub use signature::{CombineBackward, SignatureBackward};

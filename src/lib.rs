//! # sigr
//!
//! **Path signatures and log-signatures with exact gradients for Rust.**
//!
//! The signature of a path is the sequence of its iterated integrals,
//! truncated at some depth N. It lives in the truncated tensor algebra over
//! the path's D channels and is computed exactly for piecewise-linear paths
//! by multiplying together the exponentials of the segment displacements.
//! The log-signature is the same information compressed into a basis of the
//! free Lie algebra.
//!
//! ## Features
//!
//! - **Signatures**: batched, with optional basepoint, inversion and stream
//!   (every prefix) output
//! - **Log-signatures**: expanded, Lyndon-word or Lyndon-bracket (Hall) basis
//! - **Exact backward passes**: memory linear in the path, no finite differences
//! - **Chen products**: combine signatures of consecutive pieces
//! - **Interval queries**: [`signature::Path`] answers any sub-interval in one
//!   multiplication
//! - **Autograd**: [`autograd::Var`] graphs through every operation above
//!
//! ## Quick Start
//!
//! ```rust
//! use sigr::prelude::*;
//!
//! let registry = BasisRegistry::new();
//! let path = Tensor::<f64>::from_slice(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0], &[1, 3, 2]);
//!
//! let sig = signature(&registry, &path, 2, &SignatureOptions::new())?;
//! let logsig = logsignature(
//!     &registry,
//!     &path,
//!     2,
//!     &SignatureOptions::new(),
//!     LogSignatureMode::Words,
//! )?;
//! assert_eq!(sig.shape(), &[1, 6]);
//! assert_eq!(logsig.as_slice(), &[1.0, 1.0, 0.5]);
//! # Ok::<(), sigr::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): process batch entries on the rayon thread pool

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod algebra;
pub mod autograd;
pub mod basis;
pub mod dtype;
pub mod error;
pub mod logsignature;
mod runtime;
pub mod signature;
pub mod tensor;

pub use basis::{logsignature_channels, signature_channels};
pub use logsignature::{
    logsignature, logsignature_backward, signature_to_logsignature,
    signature_to_logsignature_backward,
};
pub use signature::{
    multi_signature_combine, signature, signature_backward, signature_combine,
    signature_combine_backward,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::basis::{BasisRegistry, RegistryConfig};
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::logsignature::{
        LogSignatureMode, LogSignatureReducer, logsignature, logsignature_backward,
        signature_to_logsignature,
    };
    pub use crate::signature::{
        Basepoint, Path, SignatureGrads, SignatureOptions, signature, signature_backward,
        signature_combine,
    };
    pub use crate::tensor::Tensor;
}

//! Path signatures
//!
//! The signature of a piecewise-linear path is the product, in the truncated
//! tensor algebra, of the exponentials of its segment displacements (Chen's
//! identity). [`signature`] computes it for a batch of paths and
//! [`signature_backward`] returns exact gradients with respect to the path
//! and, when one is supplied, the basepoint.
//!
//! # Example
//!
//! ```
//! use sigr::basis::BasisRegistry;
//! use sigr::signature::{SignatureOptions, signature};
//! use sigr::tensor::Tensor;
//!
//! let registry = BasisRegistry::new();
//! let path = Tensor::<f64>::from_slice(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0], &[1, 3, 2]);
//! let sig = signature(&registry, &path, 2, &SignatureOptions::new())?;
//! assert_eq!(sig.as_slice(), &[1.0, 1.0, 0.5, 1.0, 0.0, 0.5]);
//! # Ok::<(), sigr::error::Error>(())
//! ```

mod backward;
mod combine;
mod forward;
mod options;
mod path;

pub use backward::SignatureGrads;
pub use options::{Basepoint, SignatureOptions};
pub use path::Path;

pub(crate) use backward::signature_backward_with;
pub(crate) use combine::{combine_backward_with, multi_combine_with};
pub(crate) use forward::signature_with;

use crate::basis::BasisRegistry;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tensor::Tensor;

pub(crate) fn path_channels<T: Element>(path: &Tensor<T>) -> Result<usize> {
    if path.ndim() != 3 {
        return Err(Error::invalid_argument(
            "path",
            format!("expected [batch, stream, channels], got shape {:?}", path.shape()),
        ));
    }
    Ok(path.shape()[2])
}

/// Signature of a batch of paths of shape `[batch, stream, channels]`
///
/// Returns `[batch, sig_channels]`, or `[batch, points - 1, sig_channels]` in
/// stream mode where `points` counts the basepoint if one is used.
pub fn signature<T: Element>(
    registry: &BasisRegistry,
    path: &Tensor<T>,
    depth: usize,
    options: &SignatureOptions<T>,
) -> Result<Tensor<T>> {
    let words = registry.words(path_channels(path)?, depth)?;
    signature_with(&words, path, options)
}

/// Gradient of [`signature`]
///
/// `signature` must be the forward output for the same `path` and `options`;
/// it is the starting point from which prefix products are rebuilt.
pub fn signature_backward<T: Element>(
    registry: &BasisRegistry,
    grad_output: &Tensor<T>,
    path: &Tensor<T>,
    signature: &Tensor<T>,
    depth: usize,
    options: &SignatureOptions<T>,
) -> Result<SignatureGrads<T>> {
    let words = registry.words(path_channels(path)?, depth)?;
    signature_backward_with(&words, grad_output, path, signature, options)
}

/// Signature of the concatenation of two paths from their signatures
///
/// With `inverse` both inputs are taken as inverse signatures and the result
/// is the inverse signature of the concatenation.
pub fn signature_combine<T: Element>(
    registry: &BasisRegistry,
    sig1: &Tensor<T>,
    sig2: &Tensor<T>,
    channels: usize,
    depth: usize,
    inverse: bool,
) -> Result<Tensor<T>> {
    let words = registry.words(channels, depth)?;
    multi_combine_with(&words, &[sig1, sig2], inverse)
}

/// [`signature_combine`] over any number of consecutive pieces
pub fn multi_signature_combine<T: Element>(
    registry: &BasisRegistry,
    sigs: &[&Tensor<T>],
    channels: usize,
    depth: usize,
    inverse: bool,
) -> Result<Tensor<T>> {
    let words = registry.words(channels, depth)?;
    multi_combine_with(&words, sigs, inverse)
}

/// Gradients of [`signature_combine`] with respect to both inputs
pub fn signature_combine_backward<T: Element>(
    registry: &BasisRegistry,
    grad_output: &Tensor<T>,
    sig1: &Tensor<T>,
    sig2: &Tensor<T>,
    channels: usize,
    depth: usize,
    inverse: bool,
) -> Result<(Tensor<T>, Tensor<T>)> {
    let words = registry.words(channels, depth)?;
    combine_backward_with(&words, grad_output, sig1, sig2, inverse)
}

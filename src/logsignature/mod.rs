//! Log-signatures
//!
//! A log-signature is the tensor logarithm of a signature expressed in a basis
//! of the free Lie algebra. It carries the same information as the signature
//! in far fewer numbers: [`logsignature_channels`](crate::basis::logsignature_channels)
//! instead of `D + ... + D^N`.

mod reduce;

pub use reduce::{LogSignatureMode, LogSignatureReducer};

use crate::basis::BasisRegistry;
use crate::dtype::Element;
use crate::error::Result;
use crate::signature::{
    SignatureGrads, SignatureOptions, path_channels, signature_backward_with, signature_with,
};
use crate::tensor::Tensor;

fn path_reducer<T: Element>(
    registry: &BasisRegistry,
    path: &Tensor<T>,
    depth: usize,
    mode: LogSignatureMode,
) -> Result<LogSignatureReducer> {
    LogSignatureReducer::new(registry, path_channels(path)?, depth, mode)
}

/// Log-signature of a batch of paths
///
/// Shapes follow [`signature`](crate::signature::signature) with the last
/// axis replaced by the size of the chosen basis.
pub fn logsignature<T: Element>(
    registry: &BasisRegistry,
    path: &Tensor<T>,
    depth: usize,
    options: &SignatureOptions<T>,
    mode: LogSignatureMode,
) -> Result<Tensor<T>> {
    let reducer = path_reducer(registry, path, depth, mode)?;
    let sig = signature_with(reducer.indexer(), path, options)?;
    reducer.reduce(&sig)
}

/// Gradient of [`logsignature`]
///
/// The signature is recomputed from `path`; `logsignature` is only checked
/// against the expected output shape.
pub fn logsignature_backward<T: Element>(
    registry: &BasisRegistry,
    grad_output: &Tensor<T>,
    path: &Tensor<T>,
    logsignature: &Tensor<T>,
    depth: usize,
    options: &SignatureOptions<T>,
    mode: LogSignatureMode,
) -> Result<SignatureGrads<T>> {
    let reducer = path_reducer(registry, path, depth, mode)?;
    let sig = signature_with(reducer.indexer(), path, options)?;
    let mut expected = sig.shape().to_vec();
    if let Some(last) = expected.last_mut() {
        *last = reducer.output_channels();
    }
    logsignature.expect_shape(&expected)?;
    let grad_sig = reducer.reduce_backward(grad_output, &sig)?;
    signature_backward_with(reducer.indexer(), &grad_sig, path, &sig, options)
}

/// Log-signature of signatures of shape `[batch, sig]` or `[batch, stream, sig]`
pub fn signature_to_logsignature<T: Element>(
    registry: &BasisRegistry,
    signature: &Tensor<T>,
    channels: usize,
    depth: usize,
    mode: LogSignatureMode,
) -> Result<Tensor<T>> {
    LogSignatureReducer::new(registry, channels, depth, mode)?.reduce(signature)
}

/// Gradient of [`signature_to_logsignature`] with respect to the signature
pub fn signature_to_logsignature_backward<T: Element>(
    registry: &BasisRegistry,
    grad_output: &Tensor<T>,
    signature: &Tensor<T>,
    channels: usize,
    depth: usize,
    mode: LogSignatureMode,
) -> Result<Tensor<T>> {
    LogSignatureReducer::new(registry, channels, depth, mode)?.reduce_backward(grad_output, signature)
}

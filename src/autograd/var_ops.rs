//! Signature operations on [`Var`]s
//!
//! Each function runs the forward kernel and, when an input requires grad,
//! records the matching `*Backward` node so [`backward`](super::backward)
//! can reach the inputs.

use super::Var;
use super::ops::{CombineBackward, SignatureBackward, SignatureToLogSignatureBackward};
use crate::basis::BasisRegistry;
use crate::dtype::Element;
use crate::error::Result;
use crate::logsignature::{LogSignatureMode, LogSignatureReducer};
use crate::signature::{
    Basepoint, SignatureOptions, multi_combine_with, path_channels, signature_with,
};
use std::sync::Arc;

/// Signature of a tracked path
///
/// A custom basepoint in `options` is always a leaf: its gradient is stored
/// under the basepoint tensor's ID, even when `path` itself is untracked.
pub fn var_signature<T: Element>(
    registry: &BasisRegistry,
    path: &Var<T>,
    depth: usize,
    options: &SignatureOptions<T>,
) -> Result<Var<T>> {
    let words = registry.words(path_channels(path.tensor())?, depth)?;
    let output = signature_with(&words, path.tensor(), options)?;
    let custom_basepoint = matches!(options.basepoint, Basepoint::Custom(_));
    if !path.requires_grad() && !custom_basepoint {
        return Ok(Var::new(output, false));
    }
    let grad_fn = SignatureBackward::new(
        path.id(),
        path.grad_fn().cloned(),
        path.requires_grad(),
        words,
        options.clone(),
        path.tensor().clone(),
        output.clone(),
    );
    Ok(Var::from_op(output, Arc::new(grad_fn)))
}

/// Log-signature of a tracked signature of shape `[batch, sig]` or `[batch, stream, sig]`
pub fn var_signature_to_logsignature<T: Element>(
    registry: &BasisRegistry,
    signature: &Var<T>,
    channels: usize,
    depth: usize,
    mode: LogSignatureMode,
) -> Result<Var<T>> {
    let reducer = LogSignatureReducer::new(registry, channels, depth, mode)?;
    let output = reducer.reduce(signature.tensor())?;
    if !signature.requires_grad() {
        return Ok(Var::new(output, false));
    }
    let grad_fn = SignatureToLogSignatureBackward::new(
        signature.id(),
        signature.grad_fn().cloned(),
        reducer,
        signature.tensor().clone(),
    );
    Ok(Var::from_op(output, Arc::new(grad_fn)))
}

/// Log-signature of a tracked path, recorded as signature then reduction
pub fn var_logsignature<T: Element>(
    registry: &BasisRegistry,
    path: &Var<T>,
    depth: usize,
    options: &SignatureOptions<T>,
    mode: LogSignatureMode,
) -> Result<Var<T>> {
    let channels = path_channels(path.tensor())?;
    let sig = var_signature(registry, path, depth, options)?;
    var_signature_to_logsignature(registry, &sig, channels, depth, mode)
}

/// Chen product of two tracked signatures
pub fn var_signature_combine<T: Element>(
    registry: &BasisRegistry,
    sig1: &Var<T>,
    sig2: &Var<T>,
    channels: usize,
    depth: usize,
    inverse: bool,
) -> Result<Var<T>> {
    let words = registry.words(channels, depth)?;
    let output = multi_combine_with(&words, &[sig1.tensor(), sig2.tensor()], inverse)?;
    if !sig1.requires_grad() && !sig2.requires_grad() {
        return Ok(Var::new(output, false));
    }
    let grad_fn = CombineBackward::new(
        [sig1.id(), sig2.id()],
        [sig1.grad_fn().cloned(), sig2.grad_fn().cloned()],
        [sig1.requires_grad(), sig2.requires_grad()],
        words,
        inverse,
        sig1.tensor().clone(),
        sig2.tensor().clone(),
    );
    Ok(Var::from_op(output, Arc::new(grad_fn)))
}

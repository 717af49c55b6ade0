//! Chen products of already-computed signatures

use crate::algebra::{mult_backward, mult_right_inplace};
use crate::basis::WordIndexer;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::runtime::{for_each_row, for_each_row_pair};
use crate::tensor::Tensor;

fn check_sig<T: Element>(words: &WordIndexer, sig: &Tensor<T>, batch: Option<usize>) -> Result<usize> {
    let sig_len = words.signature_channels();
    if sig.ndim() != 2 || sig.shape()[1] != sig_len {
        return Err(Error::shape_mismatch(
            &[batch.unwrap_or(sig.shape().first().copied().unwrap_or(0)), sig_len],
            sig.shape(),
        ));
    }
    let b = sig.shape()[0];
    match batch {
        Some(expected) if expected != b => Err(Error::shape_mismatch(&[expected, sig_len], sig.shape())),
        _ => Ok(b),
    }
}

#[inline]
fn lift<T: Element>(dst: &mut [T], sig_row: &[T]) {
    dst[0] = T::one();
    dst[1..].copy_from_slice(sig_row);
}

/// Product `sigs[0] ⊗ sigs[1] ⊗ ...` row by row; reversed when `inverse`
pub(crate) fn multi_combine_with<T: Element>(
    words: &WordIndexer,
    sigs: &[&Tensor<T>],
    inverse: bool,
) -> Result<Tensor<T>> {
    let Some(first) = sigs.first() else {
        return Err(Error::invalid_argument(
            "signatures",
            "at least one signature is needed",
        ));
    };
    let batch = check_sig(words, first, None)?;
    for sig in &sigs[1..] {
        check_sig(words, sig, Some(batch))?;
    }

    let sig_len = words.signature_channels();
    let mut out = vec![T::zero(); batch * sig_len];
    if batch == 0 {
        return Tensor::from_vec(out, &[0, sig_len]);
    }
    for_each_row(&mut out, sig_len, |b, row| {
        let rows = || sigs.iter().map(|s| &s.as_slice()[b * sig_len..(b + 1) * sig_len]);
        let mut acc = vec![T::zero(); words.tensor_len()];
        let mut rhs = vec![T::zero(); words.tensor_len()];
        acc[0] = T::one();
        let mut fold = |sig_row: &[T]| {
            lift(&mut rhs, sig_row);
            mult_right_inplace(&mut acc, &rhs, words);
        };
        if inverse {
            rows().rev().for_each(&mut fold);
        } else {
            rows().for_each(&mut fold);
        }
        row.copy_from_slice(&acc[1..]);
        Ok(())
    })?;
    Tensor::from_vec(out, &[batch, sig_len])
}

/// Gradients of the pairwise combine with respect to both operands
pub(crate) fn combine_backward_with<T: Element>(
    words: &WordIndexer,
    grad_output: &Tensor<T>,
    sig1: &Tensor<T>,
    sig2: &Tensor<T>,
    inverse: bool,
) -> Result<(Tensor<T>, Tensor<T>)> {
    let batch = check_sig(words, sig1, None)?;
    check_sig(words, sig2, Some(batch))?;
    check_sig(words, grad_output, Some(batch))?;

    let sig_len = words.signature_channels();
    let n = words.tensor_len();
    let mut grad1 = vec![T::zero(); batch * sig_len];
    let mut grad2 = vec![T::zero(); batch * sig_len];
    if batch > 0 {
        for_each_row_pair(&mut grad1, sig_len, &mut grad2, sig_len, |b, g1, g2| {
            let row = b * sig_len..(b + 1) * sig_len;
            let (mut a, mut c, mut g) = (vec![T::zero(); n], vec![T::zero(); n], vec![T::zero(); n]);
            lift(&mut a, &sig1.as_slice()[row.clone()]);
            lift(&mut c, &sig2.as_slice()[row.clone()]);
            g[1..].copy_from_slice(&grad_output.as_slice()[row]);
            let (mut ga, mut gc) = (vec![T::zero(); n], vec![T::zero(); n]);
            if inverse {
                mult_backward(&g, &c, &a, &mut gc, &mut ga, words);
            } else {
                mult_backward(&g, &a, &c, &mut ga, &mut gc, words);
            }
            g1.copy_from_slice(&ga[1..]);
            g2.copy_from_slice(&gc[1..]);
            Ok(())
        })?;
    }
    Ok((
        Tensor::from_vec(grad1, &[batch, sig_len])?,
        Tensor::from_vec(grad2, &[batch, sig_len])?,
    ))
}

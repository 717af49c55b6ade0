//! Reverse sweep for the signature
//!
//! The forward pass keeps only the final group element (or the prefixes, in
//! stream mode). Walking the segments backwards, each earlier prefix is
//! rebuilt by peeling off one segment: `S_{k-1} = S_k ⊗ exp(-z_k)`, or
//! `exp(-z_k) ⊗ S_k` for the inverse fold. Memory stays at a handful of
//! tensors per batch entry regardless of the stream length.

use super::forward::{check_channels, output_shape};
use super::options::{Basepoint, PathView, SignatureOptions, check_path};
use crate::algebra::{exp_backward, exp_into, mult_backward, mult_into};
use crate::basis::WordIndexer;
use crate::dtype::Element;
use crate::error::Result;
use crate::runtime::for_each_row_pair;
use crate::tensor::Tensor;

/// Gradients of a signature with respect to its inputs
#[derive(Debug, Clone)]
pub struct SignatureGrads<T: Element> {
    /// Same shape as the input path
    pub path: Tensor<T>,
    /// Present only for [`Basepoint::Custom`], shape `[batch, channels]`
    pub basepoint: Option<Tensor<T>>,
}

pub(crate) fn signature_backward_with<T: Element>(
    words: &WordIndexer,
    grad_output: &Tensor<T>,
    path: &Tensor<T>,
    signature: &Tensor<T>,
    options: &SignatureOptions<T>,
) -> Result<SignatureGrads<T>> {
    let dims = check_path(path, words.depth(), options)?;
    check_channels(words, &dims, "path")?;
    let shape = output_shape(words, &dims, options.stream);
    grad_output.expect_shape(&shape)?;
    signature.expect_shape(&shape)?;

    let channels = dims.channels;
    let sig_len = words.signature_channels();
    let n = words.tensor_len();
    let segments = dims.segments();
    let out_row = shape[1..].iter().product::<usize>();

    let mut grad_path = vec![T::zero(); path.numel()];
    let mut grad_base = vec![T::zero(); dims.batch * channels];
    if dims.batch == 0 {
        return Ok(SignatureGrads {
            path: Tensor::from_vec(grad_path, path.shape())?,
            basepoint: None,
        });
    }

    let zero = vec![T::zero(); channels];
    let path_row = dims.stream * channels;
    for_each_row_pair(
        &mut grad_path,
        path_row,
        &mut grad_base,
        channels,
        |b, grad_row, base_row| {
            let view = PathView::new(path, &dims, &options.basepoint, &zero, b);
            let sig_row = &signature.as_slice()[b * out_row..(b + 1) * out_row];
            let grad_out_row = &grad_output.as_slice()[b * out_row..(b + 1) * out_row];

            // s / grad_s hold S_k and dL/dS_k in tensor layout
            let mut s = vec![T::zero(); n];
            let mut grad_s = vec![T::zero(); n];
            s[0] = T::one();
            let last = if options.stream { segments - 1 } else { 0 };
            s[1..].copy_from_slice(&sig_row[last * sig_len..(last + 1) * sig_len]);
            grad_s[1..].copy_from_slice(&grad_out_row[last * sig_len..(last + 1) * sig_len]);

            let mut prev = vec![T::zero(); n];
            let mut grad_prev = vec![T::zero(); n];
            let mut e = vec![T::zero(); n];
            let mut grad_e = vec![T::zero(); n];
            let mut e_inv = vec![T::zero(); n];
            let mut z = vec![T::zero(); channels];
            let mut neg_z = vec![T::zero(); channels];
            let mut grad_z = vec![T::zero(); channels];

            for k in (0..segments).rev() {
                view.displacement(k, options.inverse, &mut z);
                exp_into(&mut e, &z, words);

                if k == 0 {
                    prev.fill(T::zero());
                    prev[0] = T::one();
                } else if options.stream {
                    prev[0] = T::one();
                    prev[1..].copy_from_slice(&sig_row[(k - 1) * sig_len..k * sig_len]);
                } else {
                    for (nz, &v) in neg_z.iter_mut().zip(&z) {
                        *nz = -v;
                    }
                    exp_into(&mut e_inv, &neg_z, words);
                    if options.inverse {
                        mult_into(&mut prev, &e_inv, &s, words);
                    } else {
                        mult_into(&mut prev, &s, &e_inv, words);
                    }
                }

                grad_prev.fill(T::zero());
                grad_e.fill(T::zero());
                if options.inverse {
                    mult_backward(&grad_s, &e, &prev, &mut grad_e, &mut grad_prev, words);
                } else {
                    mult_backward(&grad_s, &prev, &e, &mut grad_prev, &mut grad_e, words);
                }

                grad_z.fill(T::zero());
                exp_backward(&mut grad_e, &z, &e, &mut grad_z, words);
                if options.inverse {
                    grad_z.iter_mut().for_each(|g| *g = -*g);
                }
                scatter(grad_row, base_row, view.has_basepoint(), k + 1, &grad_z, T::one());
                scatter(grad_row, base_row, view.has_basepoint(), k, &grad_z, -T::one());

                std::mem::swap(&mut s, &mut prev);
                std::mem::swap(&mut grad_s, &mut grad_prev);
                if options.stream && k > 0 {
                    let carried = &grad_out_row[(k - 1) * sig_len..k * sig_len];
                    for (g, &o) in grad_s[1..].iter_mut().zip(carried) {
                        *g += o;
                    }
                }
            }
            Ok(())
        },
    )?;

    let basepoint = match options.basepoint {
        Basepoint::Custom(_) => Some(Tensor::from_vec(grad_base, &[dims.batch, channels])?),
        _ => None,
    };
    Ok(SignatureGrads {
        path: Tensor::from_vec(grad_path, path.shape())?,
        basepoint,
    })
}

/// Add `sign * grad` to normalized point `i`, routing point 0 to the basepoint
#[inline]
fn scatter<T: Element>(
    grad_row: &mut [T],
    base_row: &mut [T],
    has_basepoint: bool,
    i: usize,
    grad: &[T],
    sign: T,
) {
    let channels = grad.len();
    let target = match (has_basepoint, i) {
        (true, 0) => &mut base_row[..],
        (true, i) => &mut grad_row[(i - 1) * channels..i * channels],
        (false, i) => &mut grad_row[i * channels..(i + 1) * channels],
    };
    for (t, &g) in target.iter_mut().zip(grad) {
        *t += sign * g;
    }
}

//! Tensor exponential of a level-1 element and its adjoint
//!
//! `exp(z) = sum_{k=0}^{N} z^{⊗k} / k!`, evaluated level by level as
//! `e_k = e_{k-1} ⊗ z / k`, which is a closed form rather than a series solve.

use crate::basis::WordIndexer;
use crate::dtype::Element;

/// `out = exp(z)` in tensor layout, `z` a displacement of length `channels`
pub(crate) fn exp_into<T: Element>(out: &mut [T], z: &[T], words: &WordIndexer) {
    out[0] = T::one();
    out[words.level_range(1)].copy_from_slice(z);
    for k in 2..=words.depth() {
        let inv_k = T::one() / T::from_usize(k);
        let (lower, upper) = out.split_at_mut(words.level_range(k).start);
        let prev = &lower[words.level_range(k - 1)];
        let cur = &mut upper[..words.level_size(k)];
        for (chunk, &pv) in cur.chunks_exact_mut(z.len()).zip(prev) {
            let scale = pv * inv_k;
            for (c, &zq) in chunk.iter_mut().zip(z) {
                *c = scale * zq;
            }
        }
    }
}

/// Adjoint of [`exp_into`]: accumulate `dL/dz` given `dL/d exp(z)`
///
/// `grad_e` is used as scratch and left clobbered. `e` must be `exp(z)`.
pub(crate) fn exp_backward<T: Element>(
    grad_e: &mut [T],
    z: &[T],
    e: &[T],
    grad_z: &mut [T],
    words: &WordIndexer,
) {
    for k in (2..=words.depth()).rev() {
        let inv_k = T::one() / T::from_usize(k);
        let (lower, upper) = grad_e.split_at_mut(words.level_range(k).start);
        let grad_prev = &mut lower[words.level_range(k - 1)];
        let grad_k = &upper[..words.level_size(k)];
        let e_prev = &e[words.level_range(k - 1)];
        for (p, chunk) in grad_k.chunks_exact(z.len()).enumerate() {
            let mut acc = T::zero();
            for (&g, &zq) in chunk.iter().zip(z) {
                acc += g * zq;
            }
            grad_prev[p] += acc * inv_k;
            let scale = e_prev[p] * inv_k;
            for (gz, &g) in grad_z.iter_mut().zip(chunk) {
                *gz += g * scale;
            }
        }
    }
    for (gz, &g) in grad_z.iter_mut().zip(&grad_e[words.level_range(1)]) {
        *gz += g;
    }
}

//! Truncated tensor product and its adjoint
//!
//! For `c = a ⊗ b`, level `k` of `c` is `sum_{i+j=k} a_i ⊗ b_j` where the
//! outer product of a level-`i` and a level-`j` component lands at the
//! concatenated word index `p * D^j + q`. Level 0 is the scalar part.

use crate::basis::WordIndexer;
use crate::dtype::Element;

/// `out[p * right.len() + q] += left[p] * right[q]`
#[inline]
fn outer_acc<T: Element>(out: &mut [T], left: &[T], right: &[T]) {
    for (chunk, &l) in out.chunks_exact_mut(right.len()).zip(left) {
        if l == T::zero() {
            continue;
        }
        for (o, &r) in chunk.iter_mut().zip(right) {
            *o += l * r;
        }
    }
}

/// `out = a ⊗ b`, all three in tensor layout
pub(crate) fn mult_into<T: Element>(out: &mut [T], a: &[T], b: &[T], words: &WordIndexer) {
    out.fill(T::zero());
    for k in 0..=words.depth() {
        let out_k = &mut out[words.level_range(k)];
        for i in 0..=k {
            outer_acc(out_k, &a[words.level_range(i)], &b[words.level_range(k - i)]);
        }
    }
}

/// `a = a ⊗ b` without a temporary
///
/// Levels are rewritten from the top down so every level reads the old values
/// of the lower levels of `a`.
pub(crate) fn mult_right_inplace<T: Element>(a: &mut [T], b: &[T], words: &WordIndexer) {
    let b0 = b[0];
    for k in (0..=words.depth()).rev() {
        let (lower, upper) = a.split_at_mut(words.level_range(k).start);
        let a_k = &mut upper[..words.level_size(k)];
        if b0 != T::one() {
            a_k.iter_mut().for_each(|v| *v *= b0);
        }
        for i in 0..k {
            outer_acc(a_k, &lower[words.level_range(i)], &b[words.level_range(k - i)]);
        }
    }
}

/// `b = a ⊗ b` without a temporary
pub(crate) fn mult_left_inplace<T: Element>(a: &[T], b: &mut [T], words: &WordIndexer) {
    let a0 = a[0];
    for k in (0..=words.depth()).rev() {
        let (lower, upper) = b.split_at_mut(words.level_range(k).start);
        let b_k = &mut upper[..words.level_size(k)];
        if a0 != T::one() {
            b_k.iter_mut().for_each(|v| *v *= a0);
        }
        for i in 1..=k {
            outer_acc(b_k, &a[words.level_range(i)], &lower[words.level_range(k - i)]);
        }
    }
}

/// Adjoint of `c = a ⊗ b`: accumulate `dL/da` and `dL/db` given `dL/dc`
///
/// The product is bilinear, so each gradient is a product of `grad_c` with the
/// other operand, contracted over that operand's half of the word.
pub(crate) fn mult_backward<T: Element>(
    grad_c: &[T],
    a: &[T],
    b: &[T],
    grad_a: &mut [T],
    grad_b: &mut [T],
    words: &WordIndexer,
) {
    for k in 0..=words.depth() {
        let g_k = &grad_c[words.level_range(k)];
        for i in 0..=k {
            let j = k - i;
            let a_i = &a[words.level_range(i)];
            let b_j = &b[words.level_range(j)];
            let grad_a_i = &mut grad_a[words.level_range(i)];
            let grad_b_j = &mut grad_b[words.level_range(j)];
            for (p, chunk) in g_k.chunks_exact(b_j.len()).enumerate() {
                let mut acc = T::zero();
                for (&g, &bq) in chunk.iter().zip(b_j) {
                    acc += g * bq;
                }
                grad_a_i[p] += acc;
                let ap = a_i[p];
                if ap != T::zero() {
                    for (gb, &g) in grad_b_j.iter_mut().zip(chunk) {
                        *gb += g * ap;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(words: &WordIndexer, seed: f64) -> Vec<f64> {
        (0..words.tensor_len())
            .map(|i| ((i as f64 + 1.0) * seed).sin())
            .collect()
    }

    #[test]
    fn test_level_one_product() {
        let words = WordIndexer::new(2, 2).unwrap();
        // a = 1 + (1, 0), b = 1 + (0, 1)
        let a = [1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let mut c = [0.0; 7];
        mult_into(&mut c, &a, &b, &words);
        assert_eq!(c, [1.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_inplace_variants_match() {
        let words = WordIndexer::new(3, 3).unwrap();
        let a = sample(&words, 0.37);
        let b = sample(&words, 1.13);
        let mut expected = vec![0.0; words.tensor_len()];
        mult_into(&mut expected, &a, &b, &words);

        let mut right = a.clone();
        mult_right_inplace(&mut right, &b, &words);
        let mut left = b.clone();
        mult_left_inplace(&a, &mut left, &words);
        for i in 0..expected.len() {
            assert!((right[i] - expected[i]).abs() < 1e-12);
            assert!((left[i] - expected[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_associative() {
        let words = WordIndexer::new(2, 4).unwrap();
        let (a, b, c) = (sample(&words, 0.2), sample(&words, 0.5), sample(&words, 0.9));
        let n = words.tensor_len();
        let (mut ab, mut ab_c, mut bc, mut a_bc) = (vec![0.0; n], vec![0.0; n], vec![0.0; n], vec![0.0; n]);
        mult_into(&mut ab, &a, &b, &words);
        mult_into(&mut ab_c, &ab, &c, &words);
        mult_into(&mut bc, &b, &c, &words);
        mult_into(&mut a_bc, &a, &bc, &words);
        for i in 0..n {
            assert!((ab_c[i] - a_bc[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_backward_is_adjoint() {
        // <grad_c, da ⊗ b + a ⊗ db> == <grad_a, da> + <grad_b, db>
        let words = WordIndexer::new(2, 3).unwrap();
        let n = words.tensor_len();
        let (a, b) = (sample(&words, 0.3), sample(&words, 0.7));
        let (da, db, g) = (sample(&words, 1.7), sample(&words, 2.3), sample(&words, 0.11));

        let (mut t1, mut t2) = (vec![0.0; n], vec![0.0; n]);
        mult_into(&mut t1, &da, &b, &words);
        mult_into(&mut t2, &a, &db, &words);
        let lhs: f64 = (0..n).map(|i| g[i] * (t1[i] + t2[i])).sum();

        let (mut grad_a, mut grad_b) = (vec![0.0; n], vec![0.0; n]);
        mult_backward(&g, &a, &b, &mut grad_a, &mut grad_b, &words);
        let rhs: f64 = (0..n).map(|i| grad_a[i] * da[i] + grad_b[i] * db[i]).sum();
        assert!((lhs - rhs).abs() < 1e-10, "{lhs} vs {rhs}");
    }
}

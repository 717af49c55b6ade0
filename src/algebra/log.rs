//! Tensor logarithm of a unit-leading element and its adjoint
//!
//! With `x = 1 + y` (`y` has no scalar part), `log(x) = sum_{k=1}^{N}
//! (-1)^(k+1) y^{⊗k} / k`. Powers beyond `N` vanish under truncation, so the
//! series is exact.

use super::multiply::{mult_backward, mult_into};
use crate::basis::WordIndexer;
use crate::dtype::Element;
use crate::error::{Error, Result};

fn check_unit<T: Element>(x: &[T], op: &'static str) -> Result<()> {
    if x[0] != T::one() {
        return Err(Error::Domain {
            op,
            reason: format!("level-0 component is {:?}, expected exactly 1", x[0]),
        });
    }
    Ok(())
}

#[inline]
fn series_coeff<T: Element>(k: usize) -> T {
    let c = T::one() / T::from_usize(k);
    if k % 2 == 0 { -c } else { c }
}

/// `out = log(x)` in tensor layout
pub(crate) fn log_into<T: Element>(out: &mut [T], x: &[T], words: &WordIndexer) -> Result<()> {
    check_unit(x, "logarithm")?;
    let mut y = x.to_vec();
    y[0] = T::zero();
    out.copy_from_slice(&y);

    let mut power = y.clone();
    let mut next = vec![T::zero(); y.len()];
    for k in 2..=words.depth() {
        mult_into(&mut next, &power, &y, words);
        std::mem::swap(&mut power, &mut next);
        let coeff = series_coeff::<T>(k);
        for (o, &p) in out.iter_mut().zip(&power) {
            *o += coeff * p;
        }
    }
    Ok(())
}

/// Adjoint of [`log_into`]: accumulate `dL/dx` given `dL/d log(x)`
///
/// Powers `y^k` are recomputed rather than saved by the forward pass, then the
/// chain `y^k = y^(k-1) ⊗ y` is unwound from the top power down.
pub(crate) fn log_backward<T: Element>(
    grad_out: &[T],
    x: &[T],
    grad_x: &mut [T],
    words: &WordIndexer,
) -> Result<()> {
    check_unit(x, "logarithm_backward")?;
    let depth = words.depth();
    let len = x.len();
    let mut y = x.to_vec();
    y[0] = T::zero();

    // powers[k - 1] = y^k, only up to y^(N-1) is needed
    let mut powers: Vec<Vec<T>> = Vec::with_capacity(depth);
    powers.push(y.clone());
    for k in 1..depth.saturating_sub(1) {
        let mut next = vec![T::zero(); len];
        mult_into(&mut next, &powers[k - 1], &y, words);
        powers.push(next);
    }

    let mut grad_y = vec![T::zero(); len];
    let mut carry = vec![T::zero(); len];
    let mut grad_power = vec![T::zero(); len];
    for k in (2..=depth).rev() {
        let coeff = series_coeff::<T>(k);
        for ((gp, &c), &g) in grad_power.iter_mut().zip(&carry).zip(grad_out) {
            *gp = c + coeff * g;
        }
        carry.fill(T::zero());
        mult_backward(&grad_power, &powers[k - 2], &y, &mut carry, &mut grad_y, words);
    }
    for (((gx, &gy), &c), &g) in grad_x.iter_mut().zip(&grad_y).zip(&carry).zip(grad_out) {
        *gx += gy + c + g;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::exp::exp_into;
    use super::*;

    #[test]
    fn test_log_inverts_exp() {
        let words = WordIndexer::new(3, 4).unwrap();
        let n = words.tensor_len();
        let z = [0.4, -1.2, 0.9];
        let mut e = vec![0.0f64; n];
        exp_into(&mut e, &z, &words);
        let mut l = vec![0.0; n];
        log_into(&mut l, &e, &words).unwrap();
        assert_eq!(l[0], 0.0);
        for (i, v) in l[1..].iter().enumerate() {
            let expected = if i < 3 { z[i] } else { 0.0 };
            assert!((v - expected).abs() < 1e-12, "index {i}: {v}");
        }
    }

    #[test]
    fn test_log_rejects_non_unit() {
        let words = WordIndexer::new(2, 2).unwrap();
        let x = [0.5, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let mut out = [0.0; 7];
        let err = log_into(&mut out, &x, &words).unwrap_err();
        assert!(matches!(err, Error::Domain { op: "logarithm", .. }));
    }

    #[test]
    fn test_log_backward_matches_finite_difference() {
        let words = WordIndexer::new(2, 4).unwrap();
        let n = words.tensor_len();
        let mut x: Vec<f64> = (0..n).map(|i| 0.3 * ((i * 5 + 1) as f64).sin()).collect();
        x[0] = 1.0;
        let weights: Vec<f64> = (0..n).map(|i| ((i * 3 + 2) as f64).cos()).collect();
        let loss = |x: &[f64]| {
            let mut l = vec![0.0; n];
            log_into(&mut l, x, &words).unwrap();
            l.iter().zip(&weights).map(|(a, b)| a * b).sum::<f64>()
        };

        let mut grad_x = vec![0.0; n];
        log_backward(&weights, &x, &mut grad_x, &words).unwrap();

        let h = 1e-6;
        for i in 1..n {
            let (mut plus, mut minus) = (x.clone(), x.clone());
            plus[i] += h;
            minus[i] -= h;
            let fd = (loss(&plus) - loss(&minus)) / (2.0 * h);
            assert!((fd - grad_x[i]).abs() < 1e-6, "index {i}: {fd} vs {}", grad_x[i]);
        }
    }
}

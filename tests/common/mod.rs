//! Common test utilities
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sigr::tensor::Tensor;

/// Deterministic RNG for a test
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Random walk of shape `[batch, stream, channels]` with steps in `[-scale, scale)`
pub fn random_path(
    rng: &mut StdRng,
    batch: usize,
    stream: usize,
    channels: usize,
    scale: f64,
) -> Tensor<f64> {
    let mut data = Vec::with_capacity(batch * stream * channels);
    for _ in 0..batch {
        let mut point: Vec<f64> = (0..channels).map(|_| rng.random_range(-1.0..1.0)).collect();
        for _ in 0..stream {
            data.extend_from_slice(&point);
            for p in point.iter_mut() {
                *p += rng.random_range(-scale..scale);
            }
        }
    }
    Tensor::from_slice(&data, &[batch, stream, channels])
}

/// Random tensor of the given shape with entries in `[-1, 1)`
pub fn random_tensor(rng: &mut StdRng, shape: &[usize]) -> Tensor<f64> {
    let numel = shape.iter().product();
    let data: Vec<f64> = (0..numel).map(|_| rng.random_range(-1.0..1.0)).collect();
    Tensor::from_slice(&data, shape)
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// `sum(weights * f(x))`
pub fn weighted_sum(out: &Tensor<f64>, weights: &Tensor<f64>) -> f64 {
    out.as_slice()
        .iter()
        .zip(weights.as_slice())
        .map(|(a, b)| a * b)
        .sum()
}

/// Central finite-difference gradient of a scalar function of a tensor
pub fn finite_difference<F>(x: &Tensor<f64>, h: f64, f: F) -> Vec<f64>
where
    F: Fn(&Tensor<f64>) -> f64,
{
    (0..x.numel())
        .map(|i| {
            let mut plus = x.to_vec();
            let mut minus = x.to_vec();
            plus[i] += h;
            minus[i] -= h;
            let plus = Tensor::from_slice(&plus, x.shape());
            let minus = Tensor::from_slice(&minus, x.shape());
            (f(&plus) - f(&minus)) / (2.0 * h)
        })
        .collect()
}

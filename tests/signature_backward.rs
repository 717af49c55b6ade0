//! Gradient checks for the signature backward pass

mod common;

use common::{
    assert_allclose_f64, finite_difference, random_path, random_tensor, rng, weighted_sum,
};
use sigr::error::Error;
use sigr::prelude::*;

const H: f64 = 1e-6;

fn check_path_gradient(channels: usize, depth: usize, options: SignatureOptions<f64>, seed: u64) {
    let registry = BasisRegistry::new();
    let mut rng = rng(seed);
    let path = random_path(&mut rng, 2, 5, channels, 0.4);
    let out = signature(&registry, &path, depth, &options).unwrap();
    let weights = random_tensor(&mut rng, out.shape());

    let grads = signature_backward(&registry, &weights, &path, &out, depth, &options).unwrap();
    assert_eq!(grads.path.shape(), path.shape());

    let fd = finite_difference(&path, H, |p| {
        weighted_sum(&signature(&registry, p, depth, &options).unwrap(), &weights)
    });
    let label = format!("D={channels} N={depth} {options:?}");
    assert_allclose_f64(grads.path.as_slice(), &fd, 1e-5, 1e-6, &label);
}

#[test]
fn test_gradient_depths_one_to_four() {
    for depth in 1..=4 {
        check_path_gradient(2, depth, SignatureOptions::new(), depth as u64);
        check_path_gradient(3, depth, SignatureOptions::new(), 10 + depth as u64);
    }
}

#[test]
fn test_gradient_inverse() {
    for depth in 1..=4 {
        check_path_gradient(2, depth, SignatureOptions::new().with_inverse(true), 20 + depth as u64);
    }
}

#[test]
fn test_gradient_stream() {
    for depth in [1, 2, 3] {
        let options = SignatureOptions::new().with_stream(true);
        check_path_gradient(2, depth, options.clone(), 30 + depth as u64);
        check_path_gradient(3, depth, options.with_inverse(true), 40 + depth as u64);
    }
}

#[test]
fn test_gradient_zero_basepoint() {
    let options = SignatureOptions::new().with_basepoint(Basepoint::Zero);
    check_path_gradient(2, 3, options.clone(), 50);
    check_path_gradient(2, 3, options.clone().with_stream(true), 51);
    check_path_gradient(3, 2, options.with_inverse(true), 52);
}

#[test]
fn test_gradient_custom_basepoint() {
    let registry = BasisRegistry::new();
    let mut rng = rng(60);
    let path = random_path(&mut rng, 2, 4, 2, 0.4);
    let origin = random_tensor(&mut rng, &[2, 2]);
    let depth = 3;
    let with = |point: &Tensor<f64>| {
        SignatureOptions::new()
            .with_basepoint(Basepoint::Custom(point.clone()))
            .with_stream(true)
    };
    let options = with(&origin);
    let out = signature(&registry, &path, depth, &options).unwrap();
    let weights = random_tensor(&mut rng, out.shape());
    let grads = signature_backward(&registry, &weights, &path, &out, depth, &options).unwrap();

    let fd_path = finite_difference(&path, H, |p| {
        weighted_sum(&signature(&registry, p, depth, &options).unwrap(), &weights)
    });
    assert_allclose_f64(grads.path.as_slice(), &fd_path, 1e-5, 1e-6, "path");

    let fd_origin = finite_difference(&origin, H, |o| {
        weighted_sum(&signature(&registry, &path, depth, &with(o)).unwrap(), &weights)
    });
    let grad_origin = grads.basepoint.expect("custom basepoint gets a gradient");
    assert_allclose_f64(grad_origin.as_slice(), &fd_origin, 1e-5, 1e-6, "basepoint");
}

#[test]
fn test_gradient_is_translation_invariant() {
    // without a basepoint the gradient sums to zero over the points
    let registry = BasisRegistry::new();
    let mut rng = rng(70);
    let path = random_path(&mut rng, 1, 6, 3, 0.5);
    let options = SignatureOptions::new();
    let out = signature(&registry, &path, 3, &options).unwrap();
    let weights = random_tensor(&mut rng, out.shape());
    let grads = signature_backward(&registry, &weights, &path, &out, 3, &options).unwrap();
    for c in 0..3 {
        let total: f64 = (0..6).map(|i| grads.path.as_slice()[i * 3 + c]).sum();
        assert!(total.abs() < 1e-10, "channel {c}: {total}");
    }
}

#[test]
fn test_long_path_reconstruction_is_stable() {
    let registry = BasisRegistry::new();
    let mut rng = rng(80);
    let path = random_path(&mut rng, 1, 64, 2, 0.1);
    let options = SignatureOptions::new();
    let out = signature(&registry, &path, 4, &options).unwrap();
    let weights = random_tensor(&mut rng, out.shape());
    let grads = signature_backward(&registry, &weights, &path, &out, 4, &options).unwrap();
    let fd = finite_difference(&path, H, |p| {
        weighted_sum(&signature(&registry, p, 4, &options).unwrap(), &weights)
    });
    assert_allclose_f64(grads.path.as_slice(), &fd, 1e-5, 1e-6, "long path");
}

#[test]
fn test_backward_shape_errors() {
    let registry = BasisRegistry::new();
    let path = Tensor::<f64>::zeros(&[1, 3, 2]);
    let options = SignatureOptions::new();
    let out = signature(&registry, &path, 2, &options).unwrap();
    let bad = Tensor::<f64>::zeros(&[1, 5]);
    assert!(matches!(
        signature_backward(&registry, &bad, &path, &out, 2, &options),
        Err(Error::ShapeMismatch { .. })
    ));
    // the saved output must match the options it was produced with
    let streamed = options.clone().with_stream(true);
    assert!(matches!(
        signature_backward(&registry, &out, &path, &out, 2, &streamed),
        Err(Error::ShapeMismatch { .. })
    ));
}

//! Integration tests for autograd through the signature family

mod common;

use common::{
    assert_allclose_f64, finite_difference, random_path, random_tensor, rng, weighted_sum,
};
use sigr::autograd::{
    Var, backward, var_logsignature, var_signature, var_signature_combine,
    var_signature_to_logsignature,
};
use sigr::prelude::*;
use sigr::signature_combine_backward;

#[test]
fn test_var_logsignature_matches_direct_backward() {
    let registry = BasisRegistry::new();
    let mut rng = rng(1);
    let options = SignatureOptions::new().with_basepoint(Basepoint::Zero);
    for mode in [LogSignatureMode::Expand, LogSignatureMode::Words, LogSignatureMode::Brackets] {
        let x = Var::new(random_path(&mut rng, 3, 5, 2, 0.5), true);
        let logsig = var_logsignature(&registry, &x, 3, &options, mode).unwrap();
        let seed = random_tensor(&mut rng, logsig.shape());
        let grads = backward(&logsig, seed.clone()).unwrap();

        let direct =
            logsignature_backward(&registry, &seed, x.tensor(), logsig.tensor(), 3, &options, mode)
                .unwrap();
        assert_allclose_f64(
            grads.get(x.id()).unwrap().as_slice(),
            direct.path.as_slice(),
            1e-12,
            1e-14,
            &format!("{mode:?}"),
        );
    }
}

#[test]
fn test_custom_basepoint_is_a_leaf() {
    let registry = BasisRegistry::new();
    let mut rng = rng(2);
    let origin = random_tensor(&mut rng, &[2, 3]);
    let options = SignatureOptions::new().with_basepoint(Basepoint::Custom(origin.clone()));
    let x = Var::new(random_path(&mut rng, 2, 4, 3, 0.5), true);
    let sig = var_signature(&registry, &x, 2, &options).unwrap();
    let seed = random_tensor(&mut rng, sig.shape());
    let grads = backward(&sig, seed.clone()).unwrap();

    let direct = signature_backward(&registry, &seed, x.tensor(), sig.tensor(), 2, &options).unwrap();
    let grad_origin = grads.get(origin.id()).expect("basepoint gradient");
    assert_eq!(grad_origin.as_slice(), direct.basepoint.unwrap().as_slice());
}

#[test]
fn test_basepoint_gradient_without_tracked_path() {
    let registry = BasisRegistry::new();
    let mut rng = rng(6);
    let origin = random_tensor(&mut rng, &[1, 2]);
    let options = SignatureOptions::new().with_basepoint(Basepoint::Custom(origin.clone()));
    let x = Var::new(random_path(&mut rng, 1, 3, 2, 0.5), false);
    let sig = var_signature(&registry, &x, 3, &options).unwrap();
    assert!(sig.requires_grad());
    let seed = random_tensor(&mut rng, sig.shape());
    let grads = backward(&sig, seed.clone()).unwrap();

    let direct = signature_backward(&registry, &seed, x.tensor(), sig.tensor(), 3, &options).unwrap();
    let grad_origin = grads.get(origin.id()).expect("basepoint gradient");
    assert_eq!(grad_origin.as_slice(), direct.basepoint.unwrap().as_slice());
    assert!(!grads.contains(x.id()));

    // without a custom basepoint nothing is recorded
    let plain = var_signature(&registry, &x, 3, &SignatureOptions::new()).unwrap();
    assert!(!plain.requires_grad());
}

#[test]
fn test_reused_variable_accumulates() {
    // s ⊗ s: both operand gradients land on the same variable
    let registry = BasisRegistry::new();
    let mut rng = rng(3);
    let x = Var::new(random_path(&mut rng, 1, 4, 2, 0.5), true);
    let s = var_signature(&registry, &x, 3, &SignatureOptions::new()).unwrap();
    let doubled = var_signature_combine(&registry, &s, &s, 2, 3, false).unwrap();
    let seed = random_tensor(&mut rng, doubled.shape());
    let grads = backward(&doubled, seed.clone()).unwrap();

    let (g1, g2) =
        signature_combine_backward(&registry, &seed, s.tensor(), s.tensor(), 2, 3, false).unwrap();
    let expected: Vec<f64> = g1.as_slice().iter().zip(g2.as_slice()).map(|(a, b)| a + b).collect();
    assert_allclose_f64(grads.get(s.id()).unwrap().as_slice(), &expected, 1e-12, 1e-14, "s");
}

#[test]
fn test_split_path_graph_matches_finite_differences() {
    // logsig(sig(a) ⊗ sig(b)) where b starts where a ends equals logsig of the whole path
    let registry = BasisRegistry::new();
    let mut rng = rng(4);
    let whole = random_path(&mut rng, 1, 6, 2, 0.4);
    let split = |p: &Tensor<f64>| {
        let data = p.as_slice();
        (
            Tensor::from_slice(&data[..8], &[1, 4, 2]),
            Tensor::from_slice(&data[6..], &[1, 3, 2]),
        )
    };
    let (a, b) = split(&whole);
    let (va, vb) = (Var::new(a, true), Var::new(b, true));
    let options = SignatureOptions::new();
    let sa = var_signature(&registry, &va, 3, &options).unwrap();
    let sb = var_signature(&registry, &vb, 3, &options).unwrap();
    let joined = var_signature_combine(&registry, &sa, &sb, 2, 3, false).unwrap();
    let logsig =
        var_signature_to_logsignature(&registry, &joined, 2, 3, LogSignatureMode::Brackets).unwrap();

    let whole_logsig =
        logsignature(&registry, &whole, 3, &options, LogSignatureMode::Brackets).unwrap();
    assert_allclose_f64(logsig.tensor().as_slice(), whole_logsig.as_slice(), 1e-10, 1e-12, "value");

    let weights = random_tensor(&mut rng, logsig.shape());
    let grads = backward(&logsig, weights.clone()).unwrap();
    let fd_a = finite_difference(va.tensor(), 1e-6, |p| {
        let sig = signature(&registry, p, 3, &options).unwrap();
        let joined = signature_combine(&registry, &sig, sb.tensor(), 2, 3, false).unwrap();
        let out = signature_to_logsignature(&registry, &joined, 2, 3, LogSignatureMode::Brackets)
            .unwrap();
        weighted_sum(&out, &weights)
    });
    assert_allclose_f64(grads.get(va.id()).unwrap().as_slice(), &fd_a, 1e-5, 1e-6, "a");
    assert!(grads.contains(vb.id()));
}

#[test]
fn test_detached_input_stops_the_graph() {
    let registry = BasisRegistry::new();
    let mut rng = rng(5);
    let x = Var::new(random_path(&mut rng, 1, 3, 2, 0.5), true);
    let s = var_signature(&registry, &x, 2, &SignatureOptions::new()).unwrap();
    let frozen = s.detach();
    assert!(!frozen.requires_grad());
    let out = var_signature_combine(&registry, &s, &frozen, 2, 2, true).unwrap();
    let grads = backward(&out, Tensor::from_slice(&[1.0; 6], &[1, 6])).unwrap();
    assert!(grads.contains(x.id()));
    assert_ne!(frozen.id(), s.id());
    assert!(grads.contains(s.id()));
    assert!(!grads.contains(frozen.id()));
}

//! Leaf distribution tests.
//!
//! Tests cover reference values, discrete support checks, marginalization and
//! parameter validation through the public leaf entry points.

use spn_rs::data::DataMatrix;
use spn_rs::leaves::{
    self, Bernoulli, Binomial, Exponential, Gamma, Gaussian, Geometric, Hypergeometric, Leaf,
    LogNormal, NegativeBinomial, Poisson,
};
use spn_rs::reference::NodeId;
use spn_rs::spn::Spn;
use spn_rs::utils::all_close;

fn single(leaf: impl Into<Leaf>) -> (Spn, NodeId) {
    let mut spn = Spn::default();
    let id = spn.mk_leaf(&[0], leaf).unwrap();
    (spn, id)
}

// ─── Reference values ──────────────────────────────────────────────────────────

#[test]
fn hypergeometric_values() {
    let (spn, h) = single(Hypergeometric::new(500, 100, 50).unwrap());
    let data = DataMatrix::column([5.0, 10.0, 15.0]);
    let probs = leaves::probability(&spn, h, &data).unwrap();
    assert!(all_close(&probs, &[0.0257071, 0.147368, 0.0270206], 1e-4, 0.0));
}

#[test]
fn log_normal_values() {
    let (spn, l) = single(LogNormal::new(0.0, 0.25).unwrap());
    let data = DataMatrix::column([0.5, 1.0, 1.5]);
    let probs = leaves::probability(&spn, l, &data).unwrap();
    assert!(all_close(&probs, &[0.0683495, 1.59577, 0.285554], 1e-4, 0.0));
}

#[test]
fn discrete_values() {
    let data = DataMatrix::column([0.0, 1.0, 2.0]);

    let (spn, b) = single(Binomial::new(2, 0.5).unwrap());
    let probs = leaves::probability(&spn, b, &data).unwrap();
    assert!(all_close(&probs, &[0.25, 0.5, 0.25], 1e-10, 0.0));

    let (spn, p) = single(Poisson::new(1.0).unwrap());
    let probs = leaves::probability(&spn, p, &data).unwrap();
    let e = (-1.0f64).exp();
    assert!(all_close(&probs, &[e, e, e / 2.0], 1e-10, 0.0));

    let (spn, nb) = single(NegativeBinomial::new(1, 0.5).unwrap());
    let probs = leaves::probability(&spn, nb, &data).unwrap();
    assert!(all_close(&probs, &[0.5, 0.25, 0.125], 1e-10, 0.0));
}

#[test]
fn continuous_values() {
    let data = DataMatrix::column([1.0, 2.0]);

    let (spn, e) = single(Exponential::new(2.0).unwrap());
    let probs = leaves::probability(&spn, e, &data).unwrap();
    assert!(all_close(
        &probs,
        &[2.0 * (-2.0f64).exp(), 2.0 * (-4.0f64).exp()],
        1e-10,
        0.0
    ));

    // Gamma(1, beta) is Exponential(beta).
    let (spn, g) = single(Gamma::new(1.0, 2.0).unwrap());
    let gamma = leaves::probability(&spn, g, &data).unwrap();
    assert!(all_close(&gamma, &probs, 1e-10, 0.0));
}

#[test]
fn continuous_values_outside_support() {
    let (spn, l) = single(LogNormal::new(0.0, 0.25).unwrap());
    let data = DataMatrix::column([0.0, -1.0]);
    assert_eq!(leaves::probability(&spn, l, &data).unwrap(), vec![0.0, 0.0]);
    let log_probs = leaves::log_probability(&spn, l, &data).unwrap();
    assert!(log_probs.iter().all(|&v| v == f64::NEG_INFINITY));

    // Gamma(1, beta) at the boundary is its rate.
    let (spn, g) = single(Gamma::new(1.0, 2.0).unwrap());
    let data = DataMatrix::column([0.0, -0.5]);
    let probs = leaves::probability(&spn, g, &data).unwrap();
    assert!(all_close(&probs, &[2.0, 0.0], 1e-12, 0.0));

    let (spn, e) = single(Exponential::new(2.0).unwrap());
    let probs = leaves::probability(&spn, e, &data).unwrap();
    assert!(all_close(&probs, &[2.0, 0.0], 1e-12, 0.0));

    // Non-finite values are still rejected.
    let data = DataMatrix::column([f64::INFINITY]);
    assert!(leaves::probability(&spn, e, &data).unwrap_err().is_domain());
}

// ─── Support ───────────────────────────────────────────────────────────────────

#[test]
fn discrete_leaves_reject_invalid_values() {
    let discrete: Vec<Leaf> = vec![
        Bernoulli::new(0.5).unwrap().into(),
        Binomial::new(5, 0.5).unwrap().into(),
        Hypergeometric::new(10, 5, 5).unwrap().into(),
        Poisson::new(2.0).unwrap().into(),
        NegativeBinomial::new(3, 0.5).unwrap().into(),
        Geometric::new(0.5).unwrap().into(),
    ];
    for leaf in discrete {
        let name = leaf.to_string();
        let (spn, id) = single(leaf);
        for x in [f64::INFINITY, f64::NEG_INFINITY, 1.5] {
            let data = DataMatrix::column([x]);
            let err = leaves::log_probability(&spn, id, &data).unwrap_err();
            assert!(err.is_domain(), "{} at {}: {}", name, x, err);
        }
        let data = DataMatrix::column([f64::NAN]);
        assert_eq!(leaves::probability(&spn, id, &data).unwrap(), vec![1.0]);
    }
}

#[test]
fn support_boundaries_accepted() {
    let (spn, b) = single(Binomial::new(4, 0.3).unwrap());
    let data = DataMatrix::column([0.0, 4.0]);
    assert!(leaves::probability(&spn, b, &data).is_ok());
    let data = DataMatrix::column([5.0]);
    assert!(leaves::probability(&spn, b, &data).unwrap_err().is_domain());

    let (spn, g) = single(Geometric::new(0.5).unwrap());
    let data = DataMatrix::column([1.0]);
    assert!((leaves::probability(&spn, g, &data).unwrap()[0] - 0.5).abs() < 1e-12);
    let data = DataMatrix::column([0.0]);
    assert!(leaves::probability(&spn, g, &data).unwrap_err().is_domain());
}

// ─── Parameters ────────────────────────────────────────────────────────────────

#[test]
fn constructors_validate_eagerly() {
    assert!(Gaussian::new(0.0, 0.0).unwrap_err().is_invalid_parameters());
    assert!(Gaussian::new(f64::NAN, 1.0).unwrap_err().is_invalid_parameters());
    assert!(Bernoulli::new(1.5).unwrap_err().is_invalid_parameters());
    assert!(Binomial::new(3, -0.1).unwrap_err().is_invalid_parameters());
    assert!(Hypergeometric::new(10, 11, 5).unwrap_err().is_invalid_parameters());
    assert!(Hypergeometric::new(10, 5, 11).unwrap_err().is_invalid_parameters());
    assert!(LogNormal::new(0.0, -1.0).unwrap_err().is_invalid_parameters());
    assert!(Poisson::new(f64::INFINITY).unwrap_err().is_invalid_parameters());
    assert!(Poisson::new(-1.0).unwrap_err().is_invalid_parameters());
    assert!(NegativeBinomial::new(3, 0.0).unwrap_err().is_invalid_parameters());
    assert!(Geometric::new(0.0).unwrap_err().is_invalid_parameters());
}

#[test]
fn setters_reject_without_clamping() {
    let mut g = Gaussian::new(1.0, 2.0).unwrap();
    assert!(g.set_params(0.0, -1.0).is_err());
    assert_eq!(g.get_params().unwrap(), (1.0, 2.0));
}

#[test]
fn unset_parameter_then_evaluate() {
    let (mut spn, p) = single(Poisson::new(3.0).unwrap());
    leaves::unset_parameter(&mut spn, p, "l").unwrap();
    let data = DataMatrix::column([1.0]);
    assert!(leaves::probability(&spn, p, &data)
        .unwrap_err()
        .is_invalid_parameters());
    assert!(leaves::parameters(&spn, p).unwrap_err().is_invalid_parameters());

    let err = leaves::unset_parameter(&mut spn, p, "rate").unwrap_err();
    assert!(err.is_invalid_parameters());
}

#[test]
fn backend_parameter_names() {
    let (spn, h) = single(Hypergeometric::new(500, 100, 50).unwrap());
    let params = leaves::parameters(&spn, h).unwrap();
    // Population, successes and draws are passed as M, n and N.
    assert_eq!(params["M"], 500.0);
    assert_eq!(params["n"], 100.0);
    assert_eq!(params["N"], 50.0);

    let (spn, e) = single(Exponential::new(4.0).unwrap());
    assert_eq!(leaves::parameters(&spn, e).unwrap()["scale"], 0.25);
}

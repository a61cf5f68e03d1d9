//! Tests for moments and sensitivity indices
//!
//! These tests verify:
//! - Polynomial chaos reproduces closed-form moments of polynomial models
//! - Monte Carlo converges to the same moments
//! - Sobol indices of ignored parameters vanish and additive models sum to one

use super::*;
use crate::chaos::CollocationRule;
use crate::config::{Method, QuantifyRequest};

#[test]
fn test_linear_model_polynomial_chaos_is_exact() {
    let engine = linear_engine(seeded_config());
    let output = engine.quantify(&QuantifyRequest::new(Method::Pc)).unwrap();
    let result = output.joint().unwrap();
    let y = result.quantity("y").unwrap();

    assert!((y.mean[0] - LINEAR_MEAN).abs() < 1e-8, "mean {}", y.mean[0]);
    assert!(
        (y.variance[0] - LINEAR_VARIANCE).abs() < 1e-8,
        "variance {}",
        y.variance[0]
    );

    // Linear and additive: first-order and total indices coincide.
    let s_a = y.first_order("a").unwrap()[0];
    let s_b = y.first_order("b").unwrap()[0];
    assert!((s_a - (4.0 / 3.0) / LINEAR_VARIANCE).abs() < 1e-8);
    assert!((s_b - 2.25 / LINEAR_VARIANCE).abs() < 1e-8);
    assert!((y.total_order("a").unwrap()[0] - s_a).abs() < 1e-8);

    // Default sample count is 2K + 2 with K = 10 for two inputs at order 3.
    assert_eq!(result.requested_samples, 22);
    assert_eq!(result.samples_used, 22);

    // Percentile bands come from the surrogate and bracket the mean.
    let p05 = y.percentile(0.05).unwrap()[0];
    let p95 = y.percentile(0.95).unwrap()[0];
    assert!(p05 < LINEAR_MEAN && LINEAR_MEAN < p95);
}

#[test]
fn test_linear_model_monte_carlo_converges() {
    let engine = linear_engine(EngineConfig {
        mc_samples: 20_000,
        ..seeded_config()
    });
    let output = engine.quantify(&QuantifyRequest::new(Method::Mc)).unwrap();
    let result = output.joint().unwrap();
    let y = result.quantity("y").unwrap();

    assert_eq!(result.samples_used, 20_000);
    assert!((y.mean[0] - LINEAR_MEAN).abs() < 0.05, "mean {}", y.mean[0]);
    assert!(
        (y.variance[0] / LINEAR_VARIANCE - 1.0).abs() < 0.05,
        "variance {}",
        y.variance[0]
    );
    assert!(y.sensitivity_first.is_none());
}

#[test]
fn test_time_series_output() {
    let space = ParameterSpace::new(vec![Parameter::uncertain("a", 1.0, uniform(0.0, 2.0))]).unwrap();
    let model = FnModel::new("ramp", |p: &ParameterVector| {
        let a = value(p, "a");
        let time: Vec<f64> = (0..5).map(f64::from).collect();
        let values = time.iter().map(|t| a * t).collect();
        Ok(ModelOutput::new(time, values))
    });
    let engine = UncertaintyEngine::new(model, space, seeded_config()).unwrap();

    let output = engine.quantify(&QuantifyRequest::new(Method::Pc)).unwrap();
    let result = output.joint().unwrap();
    let ramp = result.quantity("ramp").unwrap();

    assert_eq!(result.time.as_deref(), Some(&[0.0, 1.0, 2.0, 3.0, 4.0][..]));
    for (t, (&mean, &var)) in ramp.mean.iter().zip(&ramp.variance).enumerate() {
        let t = t as f64;
        assert!((mean - t).abs() < 1e-8);
        assert!((var - t * t / 3.0).abs() < 1e-8);
    }
    // Zero variance at t = 0 gives zero sensitivity, not NaN.
    assert_eq!(ramp.first_order("a").unwrap()[0], 0.0);
    assert!((ramp.first_order("a").unwrap()[3] - 1.0).abs() < 1e-8);
}

#[test]
fn test_ignored_parameter_has_zero_sensitivity() {
    let space = ParameterSpace::new(vec![
        Parameter::uncertain("a", 1.0, uniform(0.0, 2.0)),
        Parameter::uncertain("c", 5.0, normal(5.0, 1.0)),
    ])
    .unwrap();
    let model = FnModel::new("y", |p: &ParameterVector| {
        Ok(ModelOutput::scalar(3.0 * value(p, "a").powi(2)))
    });
    let engine = UncertaintyEngine::new(model, space, seeded_config()).unwrap();

    let output = engine.quantify(&QuantifyRequest::new(Method::Pc)).unwrap();
    let y = output.joint().unwrap().quantity("y").unwrap();

    assert!(y.first_order("c").unwrap()[0].abs() < 1e-10);
    assert!(y.total_order("c").unwrap()[0].abs() < 1e-10);
    assert!((y.first_order("a").unwrap()[0] - 1.0).abs() < 1e-10);
}

#[test]
fn test_additive_model_first_order_sums_to_one() {
    let space = ParameterSpace::new(vec![
        Parameter::uncertain("a", 0.0, uniform(-1.0, 1.0)),
        Parameter::uncertain("b", 0.0, normal(0.0, 1.0)),
        Parameter::uncertain("c", 0.0, uniform(0.0, 1.0)),
    ])
    .unwrap();
    let additive = FnModel::new("additive", |p: &ParameterVector| {
        let (a, b, c) = (value(p, "a"), value(p, "b"), value(p, "c"));
        Ok(ModelOutput::scalar(a * a + 2.0 * b.powi(3) - c))
    });
    let engine = UncertaintyEngine::new(additive, space.clone(), seeded_config()).unwrap();

    let output = engine.quantify(&QuantifyRequest::new(Method::Pc)).unwrap();
    let y = output.joint().unwrap().quantity("additive").unwrap();
    let first_sum: f64 = ["a", "b", "c"]
        .iter()
        .map(|n| y.first_order(n).unwrap()[0])
        .sum();
    assert!((first_sum - 1.0).abs() < 1e-8, "sum {first_sum}");

    let sums = y.sensitivity_first_sum.as_ref().unwrap();
    assert!((sums.values().sum::<f64>() - 1.0).abs() < 1e-12);

    // An interaction term moves variance out of the first-order indices.
    let interacting = FnModel::new("product", |p: &ParameterVector| {
        Ok(ModelOutput::scalar(value(p, "a") * value(p, "b")))
    });
    let engine = UncertaintyEngine::new(interacting, space, seeded_config()).unwrap();
    let output = engine.quantify(&QuantifyRequest::new(Method::Pc)).unwrap();
    let y = output.joint().unwrap().quantity("product").unwrap();
    let first_sum: f64 = ["a", "b", "c"]
        .iter()
        .map(|n| y.first_order(n).unwrap()[0])
        .sum();
    assert!(first_sum < 1e-8, "sum {first_sum}");
    assert!((y.total_order("a").unwrap()[0] - 1.0).abs() < 1e-8);
}

#[test]
fn test_quadrature_collocation() {
    let engine = linear_engine(EngineConfig {
        collocation: CollocationRule::Quadrature,
        polynomial_order: 2,
        ..seeded_config()
    });
    let output = engine.quantify(&QuantifyRequest::new(Method::Pc)).unwrap();
    let result = output.joint().unwrap();
    let y = result.quantity("y").unwrap();

    // (order + 1)^2 tensor nodes, independent of pc_samples.
    assert_eq!(result.samples_used, 9);
    assert!((y.mean[0] - LINEAR_MEAN).abs() < 1e-10);
    assert!((y.variance[0] - LINEAR_VARIANCE).abs() < 1e-10);
}

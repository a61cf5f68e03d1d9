//! Tests for propagation modes and request validation
//!
//! These tests verify:
//! - Single-parameter runs isolate each parameter
//! - Large parameter counts attach an advisory but still run
//! - Configuration problems surface before the model is called
//! - Correlated inputs are handled through the Rosenblatt transform

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::config::{Method, QuantifyRequest};
use crate::error::{ConfigurationError, UqError};
use crate::result::Advisory;

#[test]
fn test_single_mode_isolates_parameters() {
    let engine = linear_engine(seeded_config());
    let output = engine
        .quantify(&QuantifyRequest::new(Method::Pc).single(true))
        .unwrap();
    let results = output.single().unwrap();

    assert_eq!(results.keys().collect::<Vec<_>>(), vec!["a", "b"]);

    let only_a = &results["a"];
    assert_eq!(only_a.uncertain, vec!["a"]);
    assert_eq!(only_a.pinned, vec!["b"]);
    let y = only_a.quantity("y").unwrap();
    // b pinned at its nominal 1.0: y = 2a + 4
    assert!((y.mean[0] - 6.0).abs() < 1e-8);
    assert!((y.variance[0] - 4.0 / 3.0).abs() < 1e-8);
    assert_eq!(y.first_order("b").unwrap(), &[0.0]);
    assert_eq!(y.total_order("b").unwrap(), &[0.0]);
    assert!((y.first_order("a").unwrap()[0] - 1.0).abs() < 1e-8);

    let only_b = results["b"].quantity("y").unwrap();
    assert!((only_b.variance[0] - 2.25).abs() < 1e-8);
    assert_eq!(only_b.first_order("a").unwrap(), &[0.0]);
}

#[test]
fn test_single_mode_monte_carlo() {
    let engine = linear_engine(EngineConfig {
        mc_samples: 200,
        ..seeded_config()
    });
    let output = engine
        .quantify(&QuantifyRequest::new(Method::Mc).single(true))
        .unwrap();
    let results = output.single().unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.values().all(|r| r.samples_used == 200));
    assert_eq!(output.results().len(), 2);
}

#[test]
fn test_many_parameters_attach_advisory() {
    let params: Vec<Parameter> = (0..21)
        .map(|i| Parameter::uncertain(format!("p{i}"), 0.5, uniform(0.0, 1.0)))
        .collect();
    let space = ParameterSpace::new(params).unwrap();
    let model = FnModel::new("sum", |p: &ParameterVector| {
        Ok(ModelOutput::scalar(p.values().iter().sum()))
    });
    let engine = UncertaintyEngine::new(
        model,
        space,
        EngineConfig {
            polynomial_order: 1,
            surrogate_samples: 100,
            ..seeded_config()
        },
    )
    .unwrap();

    let output = engine.quantify(&QuantifyRequest::new(Method::Pc)).unwrap();
    let result = output.joint().unwrap();

    assert_eq!(
        result.advisories,
        vec![Advisory::ManyParameters {
            count: 21,
            threshold: 20
        }]
    );
    assert!((result.quantity("sum").unwrap().mean[0] - 10.5).abs() < 1e-8);

    let output = engine
        .quantify(&QuantifyRequest::new(Method::Pc).uncertain(&["p0", "p1"]))
        .unwrap();
    assert!(output.joint().unwrap().advisories.is_empty());
}

#[test]
fn test_configuration_errors_precede_evaluation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let space = ParameterSpace::new(vec![
        Parameter::uncertain("a", 1.0, uniform(0.0, 2.0)),
        Parameter::new("b", 1.0),
    ])
    .unwrap();
    let model = FnModel::new("y", move |p: &ParameterVector| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(ModelOutput::scalar(value(p, "a")))
    });
    let mut engine = UncertaintyEngine::new(model, space, seeded_config()).unwrap();

    let missing = engine
        .quantify(&QuantifyRequest::new(Method::Pc).uncertain(&["a", "b"]))
        .unwrap_err();
    assert_eq!(
        missing,
        UqError::Configuration(ConfigurationError::MissingDistribution("b".into()))
    );

    let unknown = engine
        .quantify(&QuantifyRequest::new(Method::Mc).uncertain(&["z"]))
        .unwrap_err();
    assert_eq!(
        unknown,
        UqError::Configuration(ConfigurationError::UnknownParameter("z".into()))
    );

    let method = QuantifyRequest::parse("spectral", "regression").unwrap_err();
    assert_eq!(method, ConfigurationError::UnknownMethod("spectral".into()));

    engine
        .parameters_mut()
        .set_distribution("b", Some(normal(1.0, 0.1)))
        .unwrap();
    engine
        .parameters_mut()
        .set_correlation(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 0.4], vec![0.4, 1.0]],
        )
        .unwrap();
    let dependent = engine
        .quantify(&QuantifyRequest::new(Method::Pc))
        .unwrap_err();
    assert!(matches!(
        dependent,
        UqError::Configuration(ConfigurationError::DependentWithoutRosenblatt(_))
    ));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_rosenblatt_preserves_correlation() {
    // Normal marginals under a Gaussian copula are jointly normal, so
    // Var(a + b) = 1 + 4 + 2 * 0.6 * 1 * 2 = 7.4.
    let mut space = ParameterSpace::new(vec![
        Parameter::uncertain("a", 0.0, normal(0.0, 1.0)),
        Parameter::uncertain("b", 3.0, normal(3.0, 2.0)),
    ])
    .unwrap();
    space
        .set_correlation(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 0.6], vec![0.6, 1.0]],
        )
        .unwrap();
    let model = FnModel::new("y", |p: &ParameterVector| {
        Ok(ModelOutput::scalar(value(p, "a") + value(p, "b")))
    });
    let engine = UncertaintyEngine::new(
        model,
        space,
        EngineConfig {
            mc_samples: 20_000,
            ..seeded_config()
        },
    )
    .unwrap();

    let pc = engine
        .quantify(&QuantifyRequest::new(Method::Pc).rosenblatt(true))
        .unwrap();
    let y = pc.joint().unwrap().quantity("y").unwrap();
    assert!((y.mean[0] - 3.0).abs() < 1e-6, "mean {}", y.mean[0]);
    assert!((y.variance[0] - 7.4).abs() < 1e-6, "variance {}", y.variance[0]);

    let mc = engine.quantify(&QuantifyRequest::new(Method::Mc)).unwrap();
    let y = mc.joint().unwrap().quantity("y").unwrap();
    assert!((y.mean[0] - 3.0).abs() < 0.1, "mean {}", y.mean[0]);
    assert!((y.variance[0] / 7.4 - 1.0).abs() < 0.05, "variance {}", y.variance[0]);
}

#[test]
fn test_custom_strategy_receives_selection() {
    let mut engine = linear_engine(seeded_config());
    engine.set_custom_strategy(crate::strategy::CustomStrategy::new(|ctx, uncertain| {
        let started = std::time::Instant::now();
        assert_eq!(uncertain, ["b".to_string()]);
        let evaluations = ctx.evaluate(uncertain, vec![vec![0.0], vec![2.0]])?;
        let quantities = ctx.statistics(&evaluations)?;
        ctx.result(Method::Custom, uncertain, &evaluations, quantities, started)
    }));

    let output = engine
        .quantify(&QuantifyRequest::new(Method::Custom).uncertain(&["b"]))
        .unwrap();
    let y = output.joint().unwrap().quantity("y").unwrap();
    // a pinned at 1.0: y = 3 + 3b over b in {0, 2}
    assert_eq!(y.mean, vec![6.0]);
    assert_eq!(y.variance, vec![9.0]);
}

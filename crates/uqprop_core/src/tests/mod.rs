//! Integration tests for the uncertainty propagation engine
//!
//! Tests are organized by topic:
//! - `moments` - Mean, variance and Sobol indices against closed forms
//! - `failures` - Index correspondence, dropped points and fail-fast runs
//! - `modes` - Single-parameter runs, advisories, custom strategies, dependence
//! - `exploration` - Monte Carlo comparison runs

mod modes;
mod moments;

use crate::config::EngineConfig;
use crate::engine::UncertaintyEngine;
use crate::model::{FnModel, ModelOutput};
use crate::parameters::{Distribution, Parameter, ParameterSpace, ParameterVector};

/// Engine with a fixed seed and a small worker pool.
fn seeded_config() -> EngineConfig {
    EngineConfig {
        seed: Some(42),
        workers: 4,
        ..Default::default()
    }
}

fn uniform(lower: f64, upper: f64) -> Distribution {
    Distribution::Uniform { lower, upper }
}

fn normal(mean: f64, std_dev: f64) -> Distribution {
    Distribution::Normal { mean, std_dev }
}

fn value(p: &ParameterVector, name: &str) -> f64 {
    p.get(name).unwrap_or(f64::NAN)
}

/// `y = 2a + 3b + 1` with `a ~ U(0, 2)` and `b ~ N(1, 0.5)`.
fn linear_engine(config: EngineConfig) -> UncertaintyEngine {
    let space = ParameterSpace::new(vec![
        Parameter::uncertain("a", 1.0, uniform(0.0, 2.0)),
        Parameter::uncertain("b", 1.0, normal(1.0, 0.5)),
    ])
    .unwrap();
    let model = FnModel::new("y", |p: &ParameterVector| {
        Ok(ModelOutput::scalar(
            2.0 * value(p, "a") + 3.0 * value(p, "b") + 1.0,
        ))
    });
    UncertaintyEngine::new(model, space, config).unwrap()
}

const LINEAR_MEAN: f64 = 6.0;
const LINEAR_VARIANCE: f64 = 4.0 / 3.0 + 9.0 * 0.25;

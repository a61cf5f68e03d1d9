//! Uncertainty propagation library
//!
//! This crate propagates parameter uncertainty through black-box models.
//! For every output quantity and time index it estimates:
//! - Mean and variance
//! - Percentile bands (5 % and 95 % by default)
//! - First-order and total Sobol sensitivity indices (polynomial chaos only)
//!
//! Two propagation strategies are built in: polynomial chaos by point
//! collocation and direct Monte Carlo. Dependent inputs are supported through
//! a Gaussian copula and the Rosenblatt transform. An exploration driver
//! sweeps distribution widths and compares Monte Carlo convergence against a
//! polynomial chaos reference.
//!
//! # Example
//!
//! ```ignore
//! use uqprop_core::{
//!     Distribution, EngineConfig, FnModel, Method, ModelOutput, Parameter, ParameterSpace,
//!     QuantifyRequest, UncertaintyEngine,
//! };
//!
//! let space = ParameterSpace::new(vec![
//!     Parameter::uncertain("kappa", 0.075, Distribution::Uniform { lower: 0.06, upper: 0.09 }),
//!     Parameter::new("u_env", 20.0),
//! ])?;
//! let model = FnModel::new("temperature", |p| {
//!     let kappa = p.get("kappa").unwrap_or_default();
//!     Ok(ModelOutput::scalar(20.0 + 75.0 * (-kappa * 200.0).exp()))
//! });
//!
//! let engine = UncertaintyEngine::new(model, space, EngineConfig::default())?;
//! let output = engine.quantify(&QuantifyRequest::new(Method::Pc))?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod chaos;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod exploration;
pub mod statistics;
pub mod strategy;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;
pub mod parameters;
pub mod result;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{EngineConfig, Method, PcMethod, QuantifyRequest};
pub use engine::{QuantifyOutput, UncertaintyEngine};
pub use error::{ConfigurationError, ModelError, UqError};
pub use evaluation::{EvaluationPool, Evaluations, PoolConfig, SamplePoint};
pub use exploration::{Exploration, ExplorationReport};
pub use model::{Feature, FeatureSet, FeatureValue, FnFeature, FnModel, Model, ModelOutput};
pub use parameters::{
    Distribution, DistributionKind, JointDistribution, Parameter, ParameterSpace, ParameterVector,
};
pub use result::{Advisory, PercentileBand, PropagationResult, QuantityStatistics};
pub use strategy::{CustomStrategy, MonteCarlo, PolynomialChaos, PropagationContext, Strategy};

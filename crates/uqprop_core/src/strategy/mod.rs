//! Propagation strategies.
//!
//! A [`Strategy`] turns a selection of uncertain parameters into a
//! [`PropagationResult`]. Strategies share one [`PropagationContext`] that
//! gives them the parameter space, the model and features, the evaluation
//! pool and the engine configuration.

mod custom;
mod monte_carlo;
mod polynomial_chaos;

pub use custom::CustomStrategy;
pub use monte_carlo::MonteCarlo;
pub use polynomial_chaos::{ChaosFit, PolynomialChaos};

use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{EngineConfig, Method};
use crate::error::Result;
use crate::evaluation::{EvaluationPool, Evaluations, SamplePoint};
use crate::model::{FeatureSet, Model, quantity_names};
use crate::parameters::ParameterSpace;
use crate::result::{PropagationResult, QuantityStatistics};

pub trait Strategy: Send + Sync {
    fn method(&self) -> Method;

    fn propagate(
        &self,
        ctx: &PropagationContext<'_>,
        uncertain: &[String],
    ) -> Result<PropagationResult>;
}

/// Everything a strategy may use during one propagation.
pub struct PropagationContext<'a> {
    pub space: &'a ParameterSpace,
    pub model: &'a Arc<dyn Model>,
    pub features: &'a FeatureSet,
    pub pool: &'a EvaluationPool,
    pub config: &'a EngineConfig,
    /// Seed for this run's random streams.
    pub seed: u64,
}

impl PropagationContext<'_> {
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    /// Output quantity names: the model, then each feature.
    pub fn quantity_names(&self) -> Vec<String> {
        quantity_names(self.model.as_ref(), self.features)
    }

    /// Parameters held at their nominal value for a run over `uncertain`.
    pub fn pinned(&self, uncertain: &[String]) -> Vec<String> {
        self.space
            .names()
            .into_iter()
            .filter(|name| !uncertain.contains(name))
            .collect()
    }

    /// `n` physical samples from the joint measure over `uncertain`.
    pub fn sample_joint(&self, uncertain: &[String], n: usize) -> Result<Vec<Vec<f64>>> {
        let joint = self.space.joint_distribution(uncertain)?;
        Ok(joint.sample(n, &mut self.rng()))
    }

    /// Evaluate the model and features at each sample, numbered in order.
    pub fn evaluate(&self, uncertain: &[String], samples: Vec<Vec<f64>>) -> Result<Evaluations> {
        let points = SamplePoint::enumerate(samples);
        self.pool
            .evaluate(self.model, self.features, self.space, uncertain, &points)
    }

    /// Empirical statistics of every quantity over the surviving outcomes.
    pub fn statistics(&self, evaluations: &Evaluations) -> Result<Vec<QuantityStatistics>> {
        self.quantity_names()
            .iter()
            .enumerate()
            .map(|(q, name)| {
                let samples = evaluations.quantity_matrix(q, name)?;
                Ok(QuantityStatistics::from_samples(
                    name.clone(),
                    &samples,
                    &self.config.percentiles,
                ))
            })
            .collect()
    }

    /// Assemble a result from a finished run.
    pub fn result(
        &self,
        method: Method,
        uncertain: &[String],
        evaluations: &Evaluations,
        quantities: Vec<QuantityStatistics>,
        started: Instant,
    ) -> Result<PropagationResult> {
        Ok(PropagationResult {
            method,
            uncertain: uncertain.to_vec(),
            pinned: self.pinned(uncertain),
            requested_samples: evaluations.requested,
            samples_used: evaluations.len(),
            failed_indices: evaluations.failed_indices(),
            time: evaluations.time()?,
            quantities,
            advisories: Vec::new(),
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }
}

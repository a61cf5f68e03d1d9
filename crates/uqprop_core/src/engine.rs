//! The uncertainty engine: owns the parameter space, model, features and
//! evaluation pool, and dispatches propagation requests to strategies.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, Method, QuantifyRequest};
use crate::error::{ConfigurationError, Result};
use crate::evaluation::EvaluationPool;
use crate::model::{FeatureSet, Model};
use crate::parameters::ParameterSpace;
use crate::result::PropagationResult;
use crate::strategy::{
    CustomStrategy, MonteCarlo, PolynomialChaos, PropagationContext, Strategy,
};

/// Output of one `quantify` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantifyOutput {
    /// All selected parameters varied together.
    Joint(PropagationResult),
    /// One isolated run per parameter, keyed by parameter name.
    Single(BTreeMap<String, PropagationResult>),
}

impl QuantifyOutput {
    pub fn joint(&self) -> Option<&PropagationResult> {
        match self {
            QuantifyOutput::Joint(result) => Some(result),
            QuantifyOutput::Single(_) => None,
        }
    }

    pub fn single(&self) -> Option<&BTreeMap<String, PropagationResult>> {
        match self {
            QuantifyOutput::Single(results) => Some(results),
            QuantifyOutput::Joint(_) => None,
        }
    }

    pub fn results(&self) -> Vec<&PropagationResult> {
        match self {
            QuantifyOutput::Joint(result) => vec![result],
            QuantifyOutput::Single(results) => results.values().collect(),
        }
    }
}

pub struct UncertaintyEngine {
    space: ParameterSpace,
    model: Arc<dyn Model>,
    features: FeatureSet,
    config: EngineConfig,
    pool: EvaluationPool,
    custom: Option<CustomStrategy>,
}

impl std::fmt::Debug for UncertaintyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UncertaintyEngine")
            .field("model", &self.model.name())
            .field("parameters", &self.space.names())
            .field("features", &self.features)
            .field("config", &self.config)
            .finish()
    }
}

impl UncertaintyEngine {
    pub fn new(
        model: impl Model + 'static,
        space: ParameterSpace,
        config: EngineConfig,
    ) -> std::result::Result<Self, ConfigurationError> {
        Self::from_shared(Arc::new(model), space, config)
    }

    pub fn from_shared(
        model: Arc<dyn Model>,
        space: ParameterSpace,
        config: EngineConfig,
    ) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        let pool = EvaluationPool::new(config.pool_config())?;
        Ok(Self {
            space,
            model,
            features: FeatureSet::new(),
            config,
            pool,
            custom: None,
        })
    }

    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    pub fn parameters(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterSpace {
        &mut self.space
    }

    pub fn model(&self) -> &Arc<dyn Model> {
        &self.model
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &EvaluationPool {
        &self.pool
    }

    pub fn set_model(&mut self, model: impl Model + 'static) {
        self.model = Arc::new(model);
    }

    pub fn set_parameters(&mut self, space: ParameterSpace) {
        self.space = space;
    }

    pub fn set_features(&mut self, features: FeatureSet) {
        self.features = features;
    }

    /// Replace the configuration; the evaluation pool is rebuilt.
    pub fn set_config(&mut self, config: EngineConfig) -> std::result::Result<(), ConfigurationError> {
        config.validate()?;
        self.pool = EvaluationPool::new(config.pool_config())?;
        self.config = config;
        Ok(())
    }

    pub fn set_custom_strategy(&mut self, strategy: CustomStrategy) {
        self.custom = Some(strategy);
    }

    /// Run the propagation described by `request`.
    pub fn quantify(&self, request: &QuantifyRequest) -> Result<QuantifyOutput> {
        let strategy = self.strategy_for(request)?;
        self.quantify_with(strategy.as_ref(), request)
    }

    /// Run `strategy` with the parameter selection and single-parameter mode
    /// of `request`. The request's method is ignored.
    pub fn quantify_with(
        &self,
        strategy: &dyn Strategy,
        request: &QuantifyRequest,
    ) -> Result<QuantifyOutput> {
        let uncertain = self
            .space
            .resolve_uncertain(request.uncertain_parameters.as_deref())?;
        let seed = self.config.seed.unwrap_or_else(rand::random);

        tracing::info!(
            method = %strategy.method(),
            model = self.model.name(),
            parameters = ?uncertain,
            single = request.single,
            "starting propagation"
        );

        if request.single {
            let mut results = BTreeMap::new();
            for name in &uncertain {
                let result = self.run_strategy(strategy, std::slice::from_ref(name), seed)?;
                results.insert(name.clone(), result);
            }
            Ok(QuantifyOutput::Single(results))
        } else {
            self.run_strategy(strategy, &uncertain, seed)
                .map(QuantifyOutput::Joint)
        }
    }

    /// One propagation over exactly `uncertain`.
    pub fn run_strategy(
        &self,
        strategy: &dyn Strategy,
        uncertain: &[String],
        seed: u64,
    ) -> Result<PropagationResult> {
        let ctx = PropagationContext {
            space: &self.space,
            model: &self.model,
            features: &self.features,
            pool: &self.pool,
            config: &self.config,
            seed,
        };
        let result = strategy.propagate(&ctx, uncertain)?;

        tracing::info!(
            method = %result.method,
            used = result.samples_used,
            failed = result.failed_indices.len(),
            elapsed_secs = result.elapsed_secs,
            "propagation finished"
        );
        Ok(result)
    }

    fn strategy_for(&self, request: &QuantifyRequest) -> Result<Box<dyn Strategy>> {
        let strategy: Box<dyn Strategy> = match request.method {
            Method::Pc => Box::new(PolynomialChaos::from_config(
                &self.config,
                request.rosenblatt,
            )),
            Method::Mc => Box::new(MonteCarlo::new(self.config.mc_samples)),
            Method::Custom => Box::new(
                self.custom
                    .clone()
                    .ok_or(ConfigurationError::MissingCustomStrategy)?,
            ),
        };
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UqError;
    use crate::model::{FnModel, ModelOutput};
    use crate::parameters::{Distribution, Parameter, ParameterVector};

    fn engine() -> UncertaintyEngine {
        let space = ParameterSpace::new(vec![
            Parameter::uncertain(
                "a",
                1.0,
                Distribution::Uniform {
                    lower: 0.0,
                    upper: 2.0,
                },
            ),
            Parameter::new("b", 5.0),
        ])
        .unwrap();
        let model = FnModel::new("y", |p: &ParameterVector| {
            Ok(ModelOutput::scalar(p.values().iter().sum()))
        });
        let config = EngineConfig {
            seed: Some(1),
            workers: 2,
            ..Default::default()
        };
        UncertaintyEngine::new(model, space, config).unwrap()
    }

    #[test]
    fn test_custom_method_requires_strategy() {
        let engine = engine();
        let err = engine
            .quantify(&QuantifyRequest::new(Method::Custom))
            .unwrap_err();
        assert_eq!(
            err,
            UqError::Configuration(ConfigurationError::MissingCustomStrategy)
        );
    }

    #[test]
    fn test_pinned_parameter_cannot_be_selected_without_distribution() {
        let engine = engine();
        let err = engine
            .quantify(&QuantifyRequest::new(Method::Mc).uncertain(&["a", "b"]))
            .unwrap_err();
        assert_eq!(
            err,
            UqError::Configuration(ConfigurationError::MissingDistribution("b".into()))
        );
    }

    #[test]
    fn test_set_config_rebuilds_pool() {
        let mut engine = engine();
        engine
            .set_config(EngineConfig {
                workers: 3,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(engine.pool().workers(), 3);

        let bad = engine.set_config(EngineConfig {
            mc_samples: 0,
            ..Default::default()
        });
        assert!(bad.is_err());
        assert_eq!(engine.pool().workers(), 3);
    }

    #[test]
    fn test_joint_output_accessors() {
        let engine = engine();
        let output = engine.quantify(&QuantifyRequest::new(Method::Pc)).unwrap();
        let result = output.joint().unwrap();
        assert_eq!(result.uncertain, vec!["a"]);
        assert_eq!(result.pinned, vec!["b"]);
        assert!((result.quantity("y").unwrap().mean[0] - 6.0).abs() < 1e-10);
        assert!(output.single().is_none());
    }
}

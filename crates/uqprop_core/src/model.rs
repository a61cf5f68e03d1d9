//! The black-box model interface and derived features.
//!
//! A [`Model`] maps one [`ParameterVector`] to a [`ModelOutput`]: a value
//! series, optionally on a time axis. A [`Feature`] reduces a model output to
//! a scalar or a series. Both must be `Send + Sync` because the evaluation pool
//! calls them from worker threads.

use std::fmt;
use std::sync::Arc;

use crate::error::ModelError;
use crate::parameters::ParameterVector;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelOutput {
    pub time: Option<Vec<f64>>,
    pub values: Vec<f64>,
}

impl ModelOutput {
    pub fn new(time: Vec<f64>, values: Vec<f64>) -> Self {
        Self {
            time: Some(time),
            values,
        }
    }

    /// Output without a time axis.
    pub fn series(values: Vec<f64>) -> Self {
        Self { time: None, values }
    }

    pub fn scalar(value: f64) -> Self {
        Self::series(vec![value])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Scalar(f64),
    Series(Vec<f64>),
}

impl FeatureValue {
    pub fn into_values(self) -> Vec<f64> {
        match self {
            FeatureValue::Scalar(v) => vec![v],
            FeatureValue::Series(values) => values,
        }
    }
}

pub trait Model: Send + Sync {
    /// Name of the model's own output quantity.
    fn name(&self) -> &str;

    fn run(&self, parameters: &ParameterVector) -> Result<ModelOutput, ModelError>;
}

pub trait Feature: Send + Sync {
    fn name(&self) -> &str;

    fn compute(&self, output: &ModelOutput) -> Result<FeatureValue, ModelError>;
}

/// Adapts a closure into a [`Model`].
pub struct FnModel<F> {
    name: String,
    run: F,
}

impl<F> FnModel<F>
where
    F: Fn(&ParameterVector) -> Result<ModelOutput, ModelError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, run: F) -> Self {
        Self {
            name: name.into(),
            run,
        }
    }
}

impl<F> Model for FnModel<F>
where
    F: Fn(&ParameterVector) -> Result<ModelOutput, ModelError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, parameters: &ParameterVector) -> Result<ModelOutput, ModelError> {
        (self.run)(parameters)
    }
}

impl<F> fmt::Debug for FnModel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnModel").field("name", &self.name).finish()
    }
}

/// Adapts a closure into a [`Feature`].
pub struct FnFeature<F> {
    name: String,
    compute: F,
}

impl<F> FnFeature<F>
where
    F: Fn(&ModelOutput) -> Result<FeatureValue, ModelError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, compute: F) -> Self {
        Self {
            name: name.into(),
            compute,
        }
    }
}

impl<F> Feature for FnFeature<F>
where
    F: Fn(&ModelOutput) -> Result<FeatureValue, ModelError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, output: &ModelOutput) -> Result<FeatureValue, ModelError> {
        (self.compute)(output)
    }
}

/// Ordered feature registry. Quantities are reported in registration order,
/// after the model's own output.
#[derive(Clone, Default)]
pub struct FeatureSet {
    features: Vec<Arc<dyn Feature>>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a feature. A feature with the same name replaces the earlier
    /// one in place.
    pub fn add(&mut self, feature: impl Feature + 'static) {
        let feature: Arc<dyn Feature> = Arc::new(feature);
        match self.features.iter().position(|f| f.name() == feature.name()) {
            Some(idx) => self.features[idx] = feature,
            None => self.features.push(feature),
        }
    }

    pub fn with(mut self, feature: impl Feature + 'static) -> Self {
        self.add(feature);
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Feature>> {
        self.features.iter()
    }
}

impl fmt::Debug for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Quantity names in output order: the model first, then each feature.
pub fn quantity_names(model: &dyn Model, features: &FeatureSet) -> Vec<String> {
    std::iter::once(model.name().to_string())
        .chain(features.names())
        .collect()
}

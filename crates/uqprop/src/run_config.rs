//! YAML run configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uqprop_core::parameters::Correlation;
use uqprop_core::{ConfigurationError, DistributionKind, EngineConfig, Parameter, ParameterSpace};

use crate::demo::CoffeeCup;

/// Width applied to the demo parameters when the config gives none.
const DEMO_INTERVAL: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSpec {
    pub kind: DistributionKind,
    pub interval: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub engine: EngineConfig,
    /// Empty means the coffee cup parameters.
    pub parameters: Vec<Parameter>,
    /// Give every parameter a distribution of this kind and width.
    pub distribution: Option<DistributionSpec>,
    pub correlation: Option<Correlation>,
}

impl RunConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)
            .map_err(|e| color_eyre::eyre::eyre!("invalid config {}: {e}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded run configuration");
        Ok(config)
    }

    pub fn build_space(&self) -> Result<ParameterSpace, ConfigurationError> {
        let (parameters, distribution) = if self.parameters.is_empty() {
            let spec = self.distribution.clone().unwrap_or(DistributionSpec {
                kind: DistributionKind::Uniform,
                interval: DEMO_INTERVAL,
            });
            (CoffeeCup::parameters(), Some(spec))
        } else {
            (self.parameters.clone(), self.distribution.clone())
        };

        let mut space = ParameterSpace::new(parameters)?;
        if let Some(spec) = distribution {
            space.set_all_distributions(spec.kind, spec.interval);
        }
        if let Some(correlation) = &self.correlation {
            space.set_correlation(correlation.names.clone(), correlation.matrix.clone())?;
        }
        Ok(space)
    }
}

//! Engine configuration and per-call propagation requests.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chaos::CollocationRule;
use crate::error::ConfigurationError;
use crate::evaluation::{PoolConfig, default_workers};

/// Engine-wide settings. Every field has a default, so partial YAML or JSON
/// documents deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum total degree of the chaos basis.
    pub polynomial_order: usize,
    /// Regression points; `None` means twice the basis size plus two.
    pub pc_samples: Option<usize>,
    pub collocation: CollocationRule,
    pub mc_samples: usize,
    /// Surrogate evaluations used for chaos percentiles.
    pub surrogate_samples: usize,
    /// Evaluation threads, defaulting to the available parallelism.
    pub workers: usize,
    pub allow_incomplete: bool,
    pub seed: Option<u64>,
    pub model_timeout_secs: Option<f64>,
    pub percentiles: Vec<f64>,
    /// Above this many uncertain parameters chaos runs carry an advisory.
    pub pce_parameter_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            polynomial_order: 3,
            pc_samples: None,
            collocation: CollocationRule::Random,
            mc_samples: 1000,
            surrogate_samples: 10_000,
            workers: default_workers(),
            allow_incomplete: false,
            seed: None,
            model_timeout_secs: None,
            percentiles: vec![0.05, 0.95],
            pce_parameter_threshold: 20,
        }
    }
}

impl EngineConfig {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.workers,
            allow_incomplete: self.allow_incomplete,
            timeout: self
                .model_timeout_secs
                .filter(|secs| secs.is_finite() && *secs > 0.0)
                .map(Duration::from_secs_f64),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.mc_samples == 0 {
            return Err(ConfigurationError::InvalidSampleCount {
                count: 0,
                reason: "mc_samples must be positive",
            });
        }
        if self.surrogate_samples < 2 {
            return Err(ConfigurationError::InvalidSampleCount {
                count: self.surrogate_samples,
                reason: "surrogate_samples must be at least 2",
            });
        }
        if self.pc_samples == Some(0) {
            return Err(ConfigurationError::InvalidSampleCount {
                count: 0,
                reason: "pc_samples must be positive",
            });
        }
        if let Some(&level) = self
            .percentiles
            .iter()
            .find(|level| !(0.0..=1.0).contains(*level))
        {
            return Err(ConfigurationError::InvalidPercentile(level));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Polynomial chaos.
    Pc,
    /// Monte Carlo.
    Mc,
    Custom,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Pc => write!(f, "pc"),
            Method::Mc => write!(f, "mc"),
            Method::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for Method {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pc" => Ok(Method::Pc),
            "mc" => Ok(Method::Mc),
            "custom" => Ok(Method::Custom),
            _ => Err(ConfigurationError::UnknownMethod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PcMethod {
    #[default]
    Regression,
}

impl FromStr for PcMethod {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regression" => Ok(PcMethod::Regression),
            _ => Err(ConfigurationError::UnknownPcMethod(s.to_string())),
        }
    }
}

/// Options for one call to `UncertaintyEngine::quantify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantifyRequest {
    pub method: Method,
    pub pc_method: PcMethod,
    /// Decorrelate dependent inputs through the Rosenblatt transform.
    pub rosenblatt: bool,
    /// One isolated run per uncertain parameter.
    pub single: bool,
    /// `None` selects every parameter that has a distribution.
    pub uncertain_parameters: Option<Vec<String>>,
}

impl Default for QuantifyRequest {
    fn default() -> Self {
        Self {
            method: Method::Pc,
            pc_method: PcMethod::Regression,
            rosenblatt: false,
            single: false,
            uncertain_parameters: None,
        }
    }
}

impl QuantifyRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Build a request from string-valued method names.
    pub fn parse(method: &str, pc_method: &str) -> Result<Self, ConfigurationError> {
        Ok(Self {
            method: method.parse()?,
            pc_method: pc_method.parse()?,
            ..Default::default()
        })
    }

    pub fn rosenblatt(mut self, rosenblatt: bool) -> Self {
        self.rosenblatt = rosenblatt;
        self
    }

    pub fn single(mut self, single: bool) -> Self {
        self.single = single;
        self
    }

    pub fn uncertain(mut self, names: &[&str]) -> Self {
        self.uncertain_parameters = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }
}

use std::time::Duration;

use thiserror::Error;

/// Problems with how a propagation was set up. Always raised before any
/// sampling or model evaluation happens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("parameter {0:?} is not defined")]
    UnknownParameter(String),
    #[error("parameter {0:?} is defined more than once")]
    DuplicateParameter(String),
    #[error("parameter {0:?} is uncertain but has no distribution")]
    MissingDistribution(String),
    #[error("invalid {kind} distribution: {reason}")]
    InvalidDistribution {
        kind: &'static str,
        reason: &'static str,
    },
    #[error("unknown propagation method {0:?} (expected pc, mc or custom)")]
    UnknownMethod(String),
    #[error("unknown polynomial chaos method {0:?} (expected regression)")]
    UnknownPcMethod(String),
    #[error("unknown distribution kind {0:?} (expected uniform or normal)")]
    UnknownDistributionKind(String),
    #[error("parameters {0:?} are correlated; polynomial chaos requires rosenblatt = true")]
    DependentWithoutRosenblatt(Vec<String>),
    #[error("invalid correlation matrix: {0}")]
    InvalidCorrelation(String),
    #[error("no uncertain parameters selected")]
    NoUncertainParameters,
    #[error("method custom requested but no custom strategy is installed")]
    MissingCustomStrategy,
    #[error("invalid sample count {count}: {reason}")]
    InvalidSampleCount { count: usize, reason: &'static str },
    #[error("percentile level {0} is outside [0, 1]")]
    InvalidPercentile(f64),
    #[error("cannot start {workers} evaluation workers: {reason}")]
    WorkerPool { workers: usize, reason: String },
}

/// Failure of a single model or feature invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("model failed: {0}")]
    Failed(String),
    #[error("model run exceeded timeout of {0:?}")]
    Timeout(Duration),
    #[error("model panicked: {0}")]
    Panicked(String),
    #[error("model produced non-finite output")]
    NonFinite,
    #[error("feature {feature:?} failed: {reason}")]
    Feature { feature: String, reason: String },
}

impl ModelError {
    pub fn failed(reason: impl Into<String>) -> Self {
        ModelError::Failed(reason.into())
    }
}

/// Errors that end one propagation run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UqError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("evaluation of sample point {index} failed: {source}")]
    Propagation {
        index: usize,
        #[source]
        source: ModelError,
    },
    #[error("only {survived} sample points survived, at least {required} are required")]
    InsufficientData { survived: usize, required: usize },
    #[error("output {quantity:?} of sample point {index} has length {found}, expected {expected}")]
    InconsistentOutput {
        quantity: String,
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("sample point {index} reports a different time axis than sample point {first}")]
    InconsistentTime { first: usize, index: usize },
    #[error("numerical failure: {0}")]
    Numerical(String),
}

impl UqError {
    /// Whether the error was raised before any model evaluation took place.
    pub fn is_configuration(&self) -> bool {
        matches!(self, UqError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, UqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = UqError::from(ConfigurationError::MissingDistribution("kappa".into()));
        assert_eq!(
            err.to_string(),
            "configuration error: parameter \"kappa\" is uncertain but has no distribution"
        );
        assert!(err.is_configuration());

        let err = UqError::InsufficientData {
            survived: 3,
            required: 10,
        };
        assert_eq!(
            err.to_string(),
            "only 3 sample points survived, at least 10 are required"
        );
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_propagation_error_source() {
        use std::error::Error;

        let err = UqError::Propagation {
            index: 4,
            source: ModelError::failed("diverged"),
        };
        assert!(err.to_string().contains("sample point 4"));
        assert_eq!(err.source().unwrap().to_string(), "model failed: diverged");
    }
}

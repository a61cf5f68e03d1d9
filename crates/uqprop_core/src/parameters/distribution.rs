//! One-dimensional input distributions.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::distr::Distribution as _;
use serde::{Deserialize, Serialize};
use statrs::distribution::ContinuousCDF;

use crate::chaos::PolynomialFamily;
use crate::error::ConfigurationError;

/// Probabilities are clamped to this distance from 0 and 1 before an inverse
/// CDF is taken, so unbounded marginals never map to infinity.
const PROBABILITY_CLAMP: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Distribution {
    Uniform { lower: f64, upper: f64 },
    Normal { mean: f64, std_dev: f64 },
    /// `exp(N(location, scale²))`
    LogNormal { location: f64, scale: f64 },
}

impl Distribution {
    /// Validate the parameters and build the sampling and CDF machinery once.
    pub fn marginal(&self) -> Result<Marginal, ConfigurationError> {
        let kind = match *self {
            Distribution::Uniform { lower, upper } => {
                if !(lower.is_finite() && upper.is_finite() && lower < upper) {
                    return Err(ConfigurationError::InvalidDistribution {
                        kind: "uniform",
                        reason: "bounds must be finite with lower < upper",
                    });
                }
                MarginalKind::Uniform {
                    sampler: rand_distr::Uniform::new_inclusive(lower, upper).map_err(|_| {
                        ConfigurationError::InvalidDistribution {
                            kind: "uniform",
                            reason: "bounds rejected by sampler",
                        }
                    })?,
                    cdf: statrs::distribution::Uniform::new(lower, upper).map_err(|_| {
                        ConfigurationError::InvalidDistribution {
                            kind: "uniform",
                            reason: "bounds rejected by cdf",
                        }
                    })?,
                }
            }
            Distribution::Normal { mean, std_dev } => {
                if !(mean.is_finite() && std_dev.is_finite() && std_dev > 0.0) {
                    return Err(ConfigurationError::InvalidDistribution {
                        kind: "normal",
                        reason: "mean must be finite and std_dev positive",
                    });
                }
                MarginalKind::Normal {
                    sampler: rand_distr::Normal::new(mean, std_dev).map_err(|_| {
                        ConfigurationError::InvalidDistribution {
                            kind: "normal",
                            reason: "std_dev rejected by sampler",
                        }
                    })?,
                    cdf: statrs::distribution::Normal::new(mean, std_dev).map_err(|_| {
                        ConfigurationError::InvalidDistribution {
                            kind: "normal",
                            reason: "std_dev rejected by cdf",
                        }
                    })?,
                }
            }
            Distribution::LogNormal { location, scale } => {
                if !(location.is_finite() && scale.is_finite() && scale > 0.0) {
                    return Err(ConfigurationError::InvalidDistribution {
                        kind: "lognormal",
                        reason: "location must be finite and scale positive",
                    });
                }
                MarginalKind::LogNormal {
                    sampler: rand_distr::LogNormal::new(location, scale).map_err(|_| {
                        ConfigurationError::InvalidDistribution {
                            kind: "lognormal",
                            reason: "scale rejected by sampler",
                        }
                    })?,
                    cdf: statrs::distribution::LogNormal::new(location, scale).map_err(|_| {
                        ConfigurationError::InvalidDistribution {
                            kind: "lognormal",
                            reason: "scale rejected by cdf",
                        }
                    })?,
                }
            }
        };

        Ok(Marginal {
            distribution: *self,
            kind,
        })
    }

    /// Polynomial family orthogonal under this distribution's germ.
    pub fn family(&self) -> PolynomialFamily {
        match self {
            Distribution::Uniform { .. } => PolynomialFamily::Legendre,
            Distribution::Normal { .. } | Distribution::LogNormal { .. } => {
                PolynomialFamily::Hermite
            }
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            Distribution::Uniform { lower, upper } => 0.5 * (lower + upper),
            Distribution::Normal { mean, .. } => mean,
            Distribution::LogNormal { location, scale } => (location + 0.5 * scale * scale).exp(),
        }
    }

    pub fn variance(&self) -> f64 {
        match *self {
            Distribution::Uniform { lower, upper } => (upper - lower).powi(2) / 12.0,
            Distribution::Normal { std_dev, .. } => std_dev * std_dev,
            Distribution::LogNormal { location, scale } => {
                let s2 = scale * scale;
                (s2.exp() - 1.0) * (2.0 * location + s2).exp()
            }
        }
    }
}

/// A validated distribution ready for sampling and CDF evaluation.
#[derive(Debug, Clone)]
pub struct Marginal {
    distribution: Distribution,
    kind: MarginalKind,
}

#[derive(Debug, Clone)]
enum MarginalKind {
    Uniform {
        sampler: rand_distr::Uniform<f64>,
        cdf: statrs::distribution::Uniform,
    },
    Normal {
        sampler: rand_distr::Normal<f64>,
        cdf: statrs::distribution::Normal,
    },
    LogNormal {
        sampler: rand_distr::LogNormal<f64>,
        cdf: statrs::distribution::LogNormal,
    },
}

impl Marginal {
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn family(&self) -> PolynomialFamily {
        self.distribution.family()
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match &self.kind {
            MarginalKind::Uniform { sampler, .. } => sampler.sample(rng),
            MarginalKind::Normal { sampler, .. } => sampler.sample(rng),
            MarginalKind::LogNormal { sampler, .. } => sampler.sample(rng),
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        match &self.kind {
            MarginalKind::Uniform { cdf, .. } => cdf.cdf(x),
            MarginalKind::Normal { cdf, .. } => cdf.cdf(x),
            MarginalKind::LogNormal { cdf, .. } => cdf.cdf(x),
        }
    }

    pub fn inverse_cdf(&self, p: f64) -> f64 {
        let p = p.clamp(PROBABILITY_CLAMP, 1.0 - PROBABILITY_CLAMP);
        match &self.kind {
            MarginalKind::Uniform { cdf, .. } => cdf.inverse_cdf(p),
            MarginalKind::Normal { cdf, .. } => cdf.inverse_cdf(p),
            MarginalKind::LogNormal { cdf, .. } => cdf.inverse_cdf(p),
        }
    }

    /// Map a germ value (`U(-1, 1)` or `N(0, 1)`) to a physical value.
    pub fn from_germ(&self, xi: f64) -> f64 {
        match self.distribution {
            Distribution::Uniform { lower, upper } => lower + 0.5 * (xi + 1.0) * (upper - lower),
            Distribution::Normal { mean, std_dev } => mean + std_dev * xi,
            Distribution::LogNormal { location, scale } => (location + scale * xi).exp(),
        }
    }
}

/// Shape used to derive a distribution around a parameter's nominal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    Uniform,
    Normal,
}

impl DistributionKind {
    /// Build a distribution whose width is `interval` times the nominal value.
    ///
    /// - uniform: `U(v - |w v| / 2, v + |w v| / 2)`
    /// - normal: `N(v, |w v|)`
    pub fn around(self, nominal: f64, interval: f64) -> Distribution {
        let width = (interval * nominal).abs();
        match self {
            DistributionKind::Uniform => Distribution::Uniform {
                lower: nominal - 0.5 * width,
                upper: nominal + 0.5 * width,
            },
            DistributionKind::Normal => Distribution::Normal {
                mean: nominal,
                std_dev: width,
            },
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionKind::Uniform => write!(f, "uniform"),
            DistributionKind::Normal => write!(f, "normal"),
        }
    }
}

impl FromStr for DistributionKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" => Ok(DistributionKind::Uniform),
            "normal" => Ok(DistributionKind::Normal),
            _ => Err(ConfigurationError::UnknownDistributionKind(s.to_string())),
        }
    }
}

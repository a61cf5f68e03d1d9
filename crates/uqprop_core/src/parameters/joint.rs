//! Joint input measure over the selected uncertain parameters.
//!
//! Independent marginals are sampled directly. Dependent marginals are tied by
//! a Gaussian copula: a standard-normal latent vector `z` is correlated with
//! the lower Cholesky factor `L`, pushed through the standard-normal CDF and
//! then through each marginal's inverse CDF. The inverse of that map is the
//! Rosenblatt transform used to decorrelate inputs for polynomial chaos.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;
use statrs::distribution::ContinuousCDF;

use crate::chaos::PolynomialFamily;
use crate::error::ConfigurationError;

use super::Marginal;
use super::space::cholesky_lower;

#[derive(Debug, Clone)]
pub struct JointDistribution {
    names: Vec<String>,
    marginals: Vec<Marginal>,
    cholesky: Option<DMatrix<f64>>,
    standard: statrs::distribution::Normal,
}

impl JointDistribution {
    pub fn new(
        names: Vec<String>,
        marginals: Vec<Marginal>,
        correlation: Option<DMatrix<f64>>,
    ) -> Result<Self, ConfigurationError> {
        if names.len() != marginals.len() {
            return Err(ConfigurationError::InvalidCorrelation(format!(
                "{} names for {} marginals",
                names.len(),
                marginals.len()
            )));
        }
        let cholesky = match correlation {
            Some(matrix) => {
                if matrix.nrows() != names.len() || matrix.ncols() != names.len() {
                    return Err(ConfigurationError::InvalidCorrelation(
                        "matrix does not match the number of parameters".to_string(),
                    ));
                }
                Some(cholesky_lower(matrix)?)
            }
            None => None,
        };
        let standard = statrs::distribution::Normal::new(0.0, 1.0).map_err(|_| {
            ConfigurationError::InvalidDistribution {
                kind: "normal",
                reason: "standard normal rejected",
            }
        })?;

        Ok(Self {
            names,
            marginals,
            cholesky,
            standard,
        })
    }

    pub fn independent(
        names: Vec<String>,
        marginals: Vec<Marginal>,
    ) -> Result<Self, ConfigurationError> {
        Self::new(names, marginals, None)
    }

    pub fn dims(&self) -> usize {
        self.marginals.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn marginals(&self) -> &[Marginal] {
        &self.marginals
    }

    pub fn is_dependent(&self) -> bool {
        self.cholesky.is_some()
    }

    /// Polynomial family of each marginal's own germ.
    pub fn families(&self) -> Vec<PolynomialFamily> {
        self.marginals.iter().map(Marginal::family).collect()
    }

    /// Draw `n` physical sample vectors.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Vec<f64>> {
        (0..n)
            .map(|_| {
                if self.is_dependent() {
                    let z: Vec<f64> = (0..self.dims())
                        .map(|_| rng.sample::<f64, _>(StandardNormal))
                        .collect();
                    self.from_latent(&z)
                } else {
                    self.marginals.iter().map(|m| m.sample(rng)).collect()
                }
            })
            .collect()
    }

    /// Map an independent standard-normal vector to physical values.
    pub fn from_latent(&self, z: &[f64]) -> Vec<f64> {
        let y = match &self.cholesky {
            Some(l) => {
                let y = l * DVector::from_column_slice(z);
                y.iter().copied().collect()
            }
            None => z.to_vec(),
        };
        y.iter()
            .zip(&self.marginals)
            .map(|(&yi, m)| m.inverse_cdf(self.standard.cdf(yi)))
            .collect()
    }

    /// Rosenblatt transform: physical values to an independent standard-normal
    /// vector.
    pub fn to_latent(&self, x: &[f64]) -> Vec<f64> {
        let y: Vec<f64> = x
            .iter()
            .zip(&self.marginals)
            .map(|(&xi, m)| {
                let p = m.cdf(xi).clamp(1e-15, 1.0 - 1e-15);
                self.standard.inverse_cdf(p)
            })
            .collect();

        match &self.cholesky {
            Some(l) => {
                let y = DVector::from_vec(y);
                match l.solve_lower_triangular(&y) {
                    Some(z) => z.iter().copied().collect(),
                    None => y.iter().copied().collect(),
                }
            }
            None => y,
        }
    }

    /// Map a vector of per-marginal germ values to physical values. Only
    /// meaningful for independent marginals.
    pub fn from_germ(&self, germ: &[f64]) -> Vec<f64> {
        germ.iter()
            .zip(&self.marginals)
            .map(|(&xi, m)| m.from_germ(xi))
            .collect()
    }
}

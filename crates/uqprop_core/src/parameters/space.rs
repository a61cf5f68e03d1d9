//! Ordered parameter collections and the parameter vectors handed to models.

use std::sync::Arc;

use nalgebra::DMatrix;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

use super::{Distribution, DistributionKind, JointDistribution};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Nominal value; used whenever the parameter is pinned.
    pub value: f64,
    #[serde(default)]
    pub distribution: Option<Distribution>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            distribution: None,
        }
    }

    pub fn uncertain(name: impl Into<String>, value: f64, distribution: Distribution) -> Self {
        Self {
            name: name.into(),
            value,
            distribution: Some(distribution),
        }
    }

    pub fn is_uncertain(&self) -> bool {
        self.distribution.is_some()
    }
}

/// Gaussian-copula dependence between a subset of parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub names: Vec<String>,
    /// Row-major correlation matrix over `names`.
    pub matrix: Vec<Vec<f64>>,
}

/// Ordered collection of parameters.
///
/// The order is the axis order of every joint distribution and sample vector
/// built from this space.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    parameters: Vec<Parameter>,
    lookup: FxHashMap<String, usize>,
    correlation: Option<Correlation>,
}

impl ParameterSpace {
    pub fn new(parameters: Vec<Parameter>) -> Result<Self, ConfigurationError> {
        let mut lookup = FxHashMap::default();
        for (idx, param) in parameters.iter().enumerate() {
            if lookup.insert(param.name.clone(), idx).is_some() {
                return Err(ConfigurationError::DuplicateParameter(param.name.clone()));
            }
        }
        Ok(Self {
            parameters,
            lookup,
            correlation: None,
        })
    }

    /// Build from `(name, nominal, distribution)` triples.
    pub fn from_list<S: Into<String>>(
        list: impl IntoIterator<Item = (S, f64, Option<Distribution>)>,
    ) -> Result<Self, ConfigurationError> {
        Self::new(
            list.into_iter()
                .map(|(name, value, distribution)| Parameter {
                    name: name.into(),
                    value,
                    distribution,
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.lookup.get(name).map(|&idx| &self.parameters[idx])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// Names of every parameter that carries a distribution, in space order.
    pub fn uncertain_names(&self) -> Vec<String> {
        self.parameters
            .iter()
            .filter(|p| p.is_uncertain())
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn nominal_values(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.value).collect()
    }

    pub fn correlation(&self) -> Option<&Correlation> {
        self.correlation.as_ref()
    }

    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), ConfigurationError> {
        let idx = self.require(name)?;
        self.parameters[idx].value = value;
        Ok(())
    }

    pub fn set_distribution(
        &mut self,
        name: &str,
        distribution: Option<Distribution>,
    ) -> Result<(), ConfigurationError> {
        let idx = self.require(name)?;
        self.parameters[idx].distribution = distribution;
        Ok(())
    }

    /// Give every parameter a distribution of `kind` whose width is `interval`
    /// times its nominal value.
    pub fn set_all_distributions(&mut self, kind: DistributionKind, interval: f64) {
        for param in &mut self.parameters {
            param.distribution = Some(kind.around(param.value, interval));
        }
    }

    /// Declare Gaussian-copula dependence between `names`.
    ///
    /// The matrix must be square, symmetric, have a unit diagonal and be
    /// positive definite.
    pub fn set_correlation(
        &mut self,
        names: Vec<String>,
        matrix: Vec<Vec<f64>>,
    ) -> Result<(), ConfigurationError> {
        for (i, name) in names.iter().enumerate() {
            self.require(name)?;
            if names[..i].contains(name) {
                return Err(ConfigurationError::InvalidCorrelation(format!(
                    "parameter {name:?} is listed more than once"
                )));
            }
        }
        if matrix.len() != names.len() {
            return Err(ConfigurationError::InvalidCorrelation(format!(
                "{} names for a {}x{} matrix",
                names.len(),
                matrix.len(),
                matrix.len()
            )));
        }
        let correlation = Correlation { names, matrix };
        correlation_cholesky(&correlation.matrix)?;
        self.correlation = Some(correlation);
        Ok(())
    }

    pub fn clear_correlation(&mut self) {
        self.correlation = None;
    }

    /// Resolve a selection of uncertain parameters. `None` selects every
    /// parameter with a distribution. Fails before any sampling if a selected
    /// parameter is unknown or has no distribution.
    pub fn resolve_uncertain(
        &self,
        selection: Option<&[String]>,
    ) -> Result<Vec<String>, ConfigurationError> {
        let names = match selection {
            Some(names) => names.to_vec(),
            None => self.uncertain_names(),
        };
        if names.is_empty() {
            return Err(ConfigurationError::NoUncertainParameters);
        }
        for name in &names {
            let idx = self.require(name)?;
            if self.parameters[idx].distribution.is_none() {
                return Err(ConfigurationError::MissingDistribution(name.clone()));
            }
        }
        Ok(names)
    }

    /// Joint probability measure over `names`.
    ///
    /// Marginals are independent unless the space carries a correlation that
    /// involves at least two of the selected names; in that case the
    /// sub-matrix for those names defines a Gaussian copula.
    pub fn joint_distribution(
        &self,
        names: &[String],
    ) -> Result<JointDistribution, ConfigurationError> {
        let names = self.resolve_uncertain(Some(names))?;

        let marginals = names
            .iter()
            .map(|name| {
                let param = &self.parameters[self.lookup[name.as_str()]];
                match &param.distribution {
                    Some(dist) => dist.marginal(),
                    None => Err(ConfigurationError::MissingDistribution(name.clone())),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let correlation = self.correlation_for(&names);
        JointDistribution::new(names, marginals, correlation)
    }

    /// Assemble a full parameter vector: `values` for `uncertain`, nominal
    /// values for everything else.
    pub fn vector(&self, uncertain: &[String], values: &[f64]) -> ParameterVector {
        let mut full = self.nominal_values();
        for (name, &value) in uncertain.iter().zip(values) {
            if let Some(&idx) = self.lookup.get(name.as_str()) {
                full[idx] = value;
            }
        }
        ParameterVector {
            names: self.names().into(),
            values: full,
        }
    }

    fn require(&self, name: &str) -> Result<usize, ConfigurationError> {
        self.position(name)
            .ok_or_else(|| ConfigurationError::UnknownParameter(name.to_string()))
    }

    /// Correlation sub-matrix restricted to `names`, in `names` order, if any
    /// off-diagonal entry is non-zero.
    fn correlation_for(&self, names: &[String]) -> Option<DMatrix<f64>> {
        let correlation = self.correlation.as_ref()?;
        let positions: Vec<Option<usize>> = names
            .iter()
            .map(|n| correlation.names.iter().position(|c| c == n))
            .collect();

        let dim = names.len();
        let mut matrix = DMatrix::identity(dim, dim);
        let mut dependent = false;
        for i in 0..dim {
            for j in 0..dim {
                if i == j {
                    continue;
                }
                if let (Some(a), Some(b)) = (positions[i], positions[j]) {
                    let rho = correlation.matrix[a][b];
                    if rho != 0.0 {
                        dependent = true;
                    }
                    matrix[(i, j)] = rho;
                }
            }
        }
        dependent.then_some(matrix)
    }
}

/// Validate a correlation matrix and return its lower Cholesky factor.
pub(crate) fn correlation_cholesky(
    matrix: &[Vec<f64>],
) -> Result<DMatrix<f64>, ConfigurationError> {
    let dim = matrix.len();
    if matrix.iter().any(|row| row.len() != dim) {
        return Err(ConfigurationError::InvalidCorrelation(
            "matrix is not square".to_string(),
        ));
    }
    for i in 0..dim {
        if (matrix[i][i] - 1.0).abs() > 1e-12 {
            return Err(ConfigurationError::InvalidCorrelation(format!(
                "diagonal entry {i} is {}, expected 1",
                matrix[i][i]
            )));
        }
        for j in 0..i {
            if (matrix[i][j] - matrix[j][i]).abs() > 1e-12 {
                return Err(ConfigurationError::InvalidCorrelation(format!(
                    "entries ({i}, {j}) and ({j}, {i}) differ"
                )));
            }
        }
    }

    let m = DMatrix::from_fn(dim, dim, |i, j| matrix[i][j]);
    cholesky_lower(m)
}

pub(crate) fn cholesky_lower(matrix: DMatrix<f64>) -> Result<DMatrix<f64>, ConfigurationError> {
    matrix
        .cholesky()
        .map(|c| c.l())
        .ok_or_else(|| ConfigurationError::InvalidCorrelation("not positive definite".to_string()))
}

/// The full set of parameter values passed to one model run.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterVector {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl ParameterVector {
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Self {
        Self {
            names: names.into(),
            values,
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

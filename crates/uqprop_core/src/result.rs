//! Propagation results.

use std::collections::BTreeMap;
use std::fmt;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::config::Method;
use crate::statistics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    /// Fraction in `[0, 1]`.
    pub level: f64,
    pub values: Vec<f64>,
}

/// Statistics for one output quantity, one value per time index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityStatistics {
    pub name: String,
    pub mean: Vec<f64>,
    pub variance: Vec<f64>,
    pub percentiles: Vec<PercentileBand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity_first: Option<BTreeMap<String, Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity_total: Option<BTreeMap<String, Vec<f64>>>,
    /// First-order indices summed over time and normalised over parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity_first_sum: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity_total_sum: Option<BTreeMap<String, f64>>,
}

impl QuantityStatistics {
    /// Mean, population variance and percentiles of a samples × width matrix.
    pub fn from_samples(name: impl Into<String>, samples: &DMatrix<f64>, levels: &[f64]) -> Self {
        let percentiles = statistics::column_percentiles(samples, levels)
            .into_iter()
            .zip(levels)
            .map(|(values, &level)| PercentileBand { level, values })
            .collect();

        Self {
            name: name.into(),
            mean: statistics::column_means(samples),
            variance: statistics::column_variances(samples),
            percentiles,
            sensitivity_first: None,
            sensitivity_total: None,
            sensitivity_first_sum: None,
            sensitivity_total_sum: None,
        }
    }

    pub fn with_sensitivity(
        mut self,
        first: BTreeMap<String, Vec<f64>>,
        total: BTreeMap<String, Vec<f64>>,
    ) -> Self {
        self.sensitivity_first_sum = Some(normalised_sums(&first));
        self.sensitivity_total_sum = Some(normalised_sums(&total));
        self.sensitivity_first = Some(first);
        self.sensitivity_total = Some(total);
        self
    }

    /// Report `names` with sensitivity exactly zero.
    pub fn pin_parameters(&mut self, names: &[String]) {
        let width = self.mean.len();
        for map in [&mut self.sensitivity_first, &mut self.sensitivity_total]
            .into_iter()
            .flatten()
        {
            for name in names {
                map.insert(name.clone(), vec![0.0; width]);
            }
        }
        for map in [
            &mut self.sensitivity_first_sum,
            &mut self.sensitivity_total_sum,
        ]
        .into_iter()
        .flatten()
        {
            for name in names {
                map.insert(name.clone(), 0.0);
            }
        }
    }

    pub fn std_dev(&self) -> Vec<f64> {
        self.variance.iter().map(|v| v.max(0.0).sqrt()).collect()
    }

    pub fn percentile(&self, level: f64) -> Option<&[f64]> {
        self.percentiles
            .iter()
            .find(|band| (band.level - level).abs() < 1e-12)
            .map(|band| band.values.as_slice())
    }

    pub fn first_order(&self, parameter: &str) -> Option<&[f64]> {
        self.sensitivity_first
            .as_ref()?
            .get(parameter)
            .map(Vec::as_slice)
    }

    pub fn total_order(&self, parameter: &str) -> Option<&[f64]> {
        self.sensitivity_total
            .as_ref()?
            .get(parameter)
            .map(Vec::as_slice)
    }
}

fn normalised_sums(indices: &BTreeMap<String, Vec<f64>>) -> BTreeMap<String, f64> {
    let sums: BTreeMap<String, f64> = indices
        .iter()
        .map(|(name, series)| (name.clone(), series.iter().sum()))
        .collect();
    let total: f64 = sums.values().sum();
    sums.into_iter()
        .map(|(name, s)| (name, if total > 0.0 { s / total } else { 0.0 }))
        .collect()
}

/// Non-fatal observations attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    ManyParameters { count: usize, threshold: usize },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::ManyParameters { count, threshold } => write!(
                f,
                "{count} uncertain parameters exceed the polynomial chaos threshold of \
                 {threshold}; Monte Carlo may be cheaper"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationResult {
    pub method: Method,
    pub uncertain: Vec<String>,
    pub pinned: Vec<String>,
    pub requested_samples: usize,
    pub samples_used: usize,
    pub failed_indices: Vec<usize>,
    pub time: Option<Vec<f64>>,
    /// Model output first, then features in registration order.
    pub quantities: Vec<QuantityStatistics>,
    #[serde(default)]
    pub advisories: Vec<Advisory>,
    pub elapsed_secs: f64,
}

impl PropagationResult {
    pub fn quantity(&self, name: &str) -> Option<&QuantityStatistics> {
        self.quantities.iter().find(|q| q.name == name)
    }

    pub fn quantity_names(&self) -> Vec<&str> {
        self.quantities.iter().map(|q| q.name.as_str()).collect()
    }
}

//! Sweeps over distribution shapes and Monte Carlo convergence comparisons.

use std::collections::BTreeMap;

use crate::config::{Method, QuantifyRequest};
use crate::engine::{QuantifyOutput, UncertaintyEngine};
use crate::error::{Result, UqError};
use crate::parameters::DistributionKind;
use crate::strategy::MonteCarlo;

/// Per-configuration outcomes keyed by label. A failing configuration keeps
/// its error and does not stop the sweep.
#[derive(Debug, Clone, Default)]
pub struct ExplorationReport {
    pub entries: BTreeMap<String, Result<QuantifyOutput>>,
}

impl ExplorationReport {
    pub fn get(&self, label: &str) -> Option<&Result<QuantifyOutput>> {
        self.entries.get(label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn failures(&self) -> Vec<(&str, &UqError)> {
        self.entries
            .iter()
            .filter_map(|(label, entry)| entry.as_ref().err().map(|e| (label.as_str(), e)))
            .collect()
    }

    /// Mean and variance of `quantity` for every successful joint run.
    pub fn moments(&self, quantity: &str) -> BTreeMap<String, (Vec<f64>, Vec<f64>)> {
        self.entries
            .iter()
            .filter_map(|(label, entry)| {
                let stats = entry.as_ref().ok()?.joint()?.quantity(quantity)?;
                Some((label.clone(), (stats.mean.clone(), stats.variance.clone())))
            })
            .collect()
    }
}

/// Drives repeated propagations on one engine.
#[derive(Debug)]
pub struct Exploration {
    engine: UncertaintyEngine,
}

impl Exploration {
    pub fn new(engine: UncertaintyEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &UncertaintyEngine {
        &self.engine
    }

    pub fn into_engine(self) -> UncertaintyEngine {
        self.engine
    }

    /// For every `(kind, intervals)` pair and every interval, give all
    /// parameters a `kind` distribution of that width and run `request`.
    /// Labels are `"{kind}_{interval}"`. The parameter space is restored
    /// afterwards.
    pub fn explore_parameters(
        &mut self,
        distributions: &[(DistributionKind, Vec<f64>)],
        request: &QuantifyRequest,
    ) -> ExplorationReport {
        let original = self.engine.parameters().clone();
        let mut report = ExplorationReport::default();

        for (kind, intervals) in distributions {
            for &interval in intervals {
                let label = format!("{kind}_{interval}");
                self.engine
                    .parameters_mut()
                    .set_all_distributions(*kind, interval);

                let outcome = self.engine.quantify(request);
                if let Err(err) = &outcome {
                    tracing::warn!(%label, error = %err, "exploration run failed");
                }
                report.entries.insert(label, outcome);
            }
        }

        self.engine.set_parameters(original);
        report
    }

    /// One polynomial chaos run labelled `"pc"` and one Monte Carlo run per
    /// sample count labelled `"mc_{n}"`.
    pub fn compare_mc(
        &self,
        sample_counts: &[usize],
        request: &QuantifyRequest,
    ) -> ExplorationReport {
        let mut report = ExplorationReport::default();

        let pc = QuantifyRequest {
            method: Method::Pc,
            ..request.clone()
        };
        let outcome = self.engine.quantify(&pc);
        report
            .entries
            .insert("pc".to_string(), self.record("pc", outcome));

        for &n in sample_counts {
            let label = format!("mc_{n}");
            let outcome = self.engine.quantify_with(&MonteCarlo::new(n), request);
            let outcome = self.record(&label, outcome);
            report.entries.insert(label, outcome);
        }
        report
    }

    fn record(&self, label: &str, outcome: Result<QuantifyOutput>) -> Result<QuantifyOutput> {
        match &outcome {
            Ok(_) => tracing::debug!(%label, "comparison run finished"),
            Err(err) => tracing::warn!(%label, error = %err, "comparison run failed"),
        }
        outcome
    }
}

//! Polynomial chaos by point collocation (least-squares regression).
//!
//! The basis is orthogonal under the germ measure of each input. With the
//! Rosenblatt option every input is represented by an independent standard
//! normal latent variable instead, so the basis is Hermite in every dimension
//! and collocation points are mapped to physical values through the copula.

use std::collections::BTreeMap;
use std::time::Instant;

use nalgebra::DMatrix;

use crate::chaos::{ChaosBasis, ChaosExpansion, CollocationRule, PolynomialFamily};
use crate::config::{EngineConfig, Method};
use crate::error::{ConfigurationError, Result};
use crate::evaluation::Evaluations;
use crate::result::{Advisory, PercentileBand, PropagationResult, QuantityStatistics};
use crate::statistics;

use super::{PropagationContext, Strategy};

#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialChaos {
    pub order: usize,
    /// `None` means `2K + 2` for a basis of `K` terms.
    pub samples: Option<usize>,
    pub rule: CollocationRule,
    pub rosenblatt: bool,
    pub surrogate_samples: usize,
    pub parameter_threshold: usize,
}

impl PolynomialChaos {
    pub fn from_config(config: &EngineConfig, rosenblatt: bool) -> Self {
        Self {
            order: config.polynomial_order,
            samples: config.pc_samples,
            rule: config.collocation,
            rosenblatt,
            surrogate_samples: config.surrogate_samples,
            parameter_threshold: config.pce_parameter_threshold,
        }
    }

    /// Sample, evaluate and fit one expansion per output quantity.
    pub fn fit(&self, ctx: &PropagationContext<'_>, uncertain: &[String]) -> Result<ChaosFit> {
        let joint = ctx.space.joint_distribution(uncertain)?;
        if joint.is_dependent() && !self.rosenblatt {
            return Err(ConfigurationError::DependentWithoutRosenblatt(uncertain.to_vec()).into());
        }

        let families = if self.rosenblatt {
            vec![PolynomialFamily::Hermite; joint.dims()]
        } else {
            joint.families()
        };
        let basis = ChaosBasis::total_degree(families.clone(), self.order);
        let count = self.samples.unwrap_or(2 * basis.len() + 2);

        let mut rng = ctx.rng();
        let germs = self
            .rule
            .germ_points(&families, self.order, count, &mut rng);
        let physical: Vec<Vec<f64>> = germs
            .iter()
            .map(|germ| {
                if self.rosenblatt {
                    joint.from_latent(germ)
                } else {
                    joint.from_germ(germ)
                }
            })
            .collect();

        tracing::debug!(
            terms = basis.len(),
            points = physical.len(),
            rule = ?self.rule,
            rosenblatt = self.rosenblatt,
            "polynomial chaos collocation"
        );

        let evaluations = ctx.evaluate(uncertain, physical)?;
        evaluations.require(basis.len())?;

        // Design rows and outputs are filtered by the same surviving indices.
        let surviving: Vec<&[f64]> = evaluations
            .outcomes
            .iter()
            .map(|o| germs[o.index].as_slice())
            .collect();
        let design = basis.design_matrix(&surviving);

        let expansions = ctx
            .quantity_names()
            .iter()
            .enumerate()
            .map(|(q, name)| {
                let outputs = evaluations.quantity_matrix(q, name)?;
                ChaosExpansion::fit(basis.clone(), &design, &outputs)
            })
            .collect::<Result<Vec<_>>>()?;

        let surrogate_germs = CollocationRule::Random.germ_points(
            &families,
            self.order,
            self.surrogate_samples,
            &mut rng,
        );

        Ok(ChaosFit {
            germs,
            design,
            expansions,
            evaluations,
            surrogate_germs,
        })
    }
}

/// Intermediate products of a chaos fit.
#[derive(Debug, Clone)]
pub struct ChaosFit {
    /// Every collocation point in germ space, indexed by sample index.
    pub germs: Vec<Vec<f64>>,
    /// Design matrix over the surviving collocation points.
    pub design: DMatrix<f64>,
    /// One expansion per output quantity.
    pub expansions: Vec<ChaosExpansion>,
    pub evaluations: Evaluations,
    /// Germ draws the fitted surrogate is resampled at for percentiles.
    surrogate_germs: Vec<Vec<f64>>,
}

impl ChaosFit {
    fn statistics(
        &self,
        names: &[String],
        uncertain: &[String],
        levels: &[f64],
    ) -> Vec<QuantityStatistics> {
        names
            .iter()
            .zip(&self.expansions)
            .map(|(name, expansion)| {
                let surrogate = expansion.evaluate(&self.surrogate_germs);
                let percentiles = statistics::column_percentiles(&surrogate, levels)
                    .into_iter()
                    .zip(levels)
                    .map(|(values, &level)| PercentileBand { level, values })
                    .collect();

                let first: BTreeMap<String, Vec<f64>> = uncertain
                    .iter()
                    .enumerate()
                    .map(|(dim, param)| (param.clone(), expansion.sobol_first(dim)))
                    .collect();
                let total: BTreeMap<String, Vec<f64>> = uncertain
                    .iter()
                    .enumerate()
                    .map(|(dim, param)| (param.clone(), expansion.sobol_total(dim)))
                    .collect();

                QuantityStatistics {
                    name: name.clone(),
                    mean: expansion.mean(),
                    variance: expansion.variance(),
                    percentiles,
                    sensitivity_first: None,
                    sensitivity_total: None,
                    sensitivity_first_sum: None,
                    sensitivity_total_sum: None,
                }
                .with_sensitivity(first, total)
            })
            .collect()
    }
}

impl Strategy for PolynomialChaos {
    fn method(&self) -> Method {
        Method::Pc
    }

    fn propagate(
        &self,
        ctx: &PropagationContext<'_>,
        uncertain: &[String],
    ) -> Result<PropagationResult> {
        let started = Instant::now();

        let mut advisories = Vec::new();
        if uncertain.len() > self.parameter_threshold {
            let advisory = Advisory::ManyParameters {
                count: uncertain.len(),
                threshold: self.parameter_threshold,
            };
            tracing::warn!("{advisory}");
            advisories.push(advisory);
        }

        let fit = self.fit(ctx, uncertain)?;
        let mut quantities =
            fit.statistics(&ctx.quantity_names(), uncertain, &ctx.config.percentiles);

        // Pinned parameters that could have been uncertain get zero sensitivity.
        let pinned: Vec<String> = ctx
            .pinned(uncertain)
            .into_iter()
            .filter(|name| {
                ctx.space
                    .get(name)
                    .is_some_and(|param| param.is_uncertain())
            })
            .collect();
        for stats in &mut quantities {
            stats.pin_parameters(&pinned);
        }

        let mut result = ctx.result(Method::Pc, uncertain, &fit.evaluations, quantities, started)?;
        result.advisories = advisories;
        Ok(result)
    }
}

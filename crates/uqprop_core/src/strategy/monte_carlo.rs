use std::time::Instant;

use crate::config::Method;
use crate::error::{ConfigurationError, Result};
use crate::result::PropagationResult;

use super::{PropagationContext, Strategy};

/// Direct sampling of the joint input measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonteCarlo {
    pub samples: usize,
}

impl MonteCarlo {
    /// Fewer survivors than this cannot give a variance.
    pub const MIN_SURVIVORS: usize = 2;

    pub fn new(samples: usize) -> Self {
        Self { samples }
    }
}

impl Strategy for MonteCarlo {
    fn method(&self) -> Method {
        Method::Mc
    }

    fn propagate(
        &self,
        ctx: &PropagationContext<'_>,
        uncertain: &[String],
    ) -> Result<PropagationResult> {
        let started = Instant::now();
        if self.samples < Self::MIN_SURVIVORS {
            return Err(ConfigurationError::InvalidSampleCount {
                count: self.samples,
                reason: "Monte Carlo needs at least 2 samples",
            }
            .into());
        }

        let samples = ctx.sample_joint(uncertain, self.samples)?;
        tracing::debug!(samples = samples.len(), "monte carlo samples drawn");

        let evaluations = ctx.evaluate(uncertain, samples)?;
        evaluations.require(Self::MIN_SURVIVORS)?;

        let quantities = ctx.statistics(&evaluations)?;
        ctx.result(Method::Mc, uncertain, &evaluations, quantities, started)
    }
}

//! Uncertain parameters and the probability measures placed on them.

mod distribution;
mod joint;
mod space;

pub use distribution::{Distribution, DistributionKind, Marginal};
pub use joint::JointDistribution;
pub use space::{Correlation, Parameter, ParameterSpace, ParameterVector};

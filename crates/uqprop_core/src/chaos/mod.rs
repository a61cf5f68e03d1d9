//! Polynomial chaos building blocks: univariate families, the truncated
//! multivariate basis, collocation rules and the regression fit.

mod basis;
mod collocation;
mod expansion;
mod polynomial;

pub use basis::ChaosBasis;
pub use collocation::CollocationRule;
pub use expansion::{ChaosExpansion, least_squares};
pub use polynomial::PolynomialFamily;

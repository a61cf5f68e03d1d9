//! Least-squares fitting of chaos coefficients and the statistics that follow
//! from them without further sampling.

use nalgebra::DMatrix;

use crate::error::{Result, UqError};

use super::ChaosBasis;

/// Singular values below this fraction of the largest are treated as zero.
const SVD_RELATIVE_TOLERANCE: f64 = 1e-12;

/// Relative variance below which an output is treated as deterministic.
const VARIANCE_FLOOR: f64 = 1e-20;

/// Solve `design · C ≈ outputs` in the least-squares sense.
///
/// `design` is `n × K`, `outputs` is `n × m`; the result is `K × m`, one column
/// of coefficients per output column. All columns share one SVD.
pub fn least_squares(design: &DMatrix<f64>, outputs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    if design.nrows() != outputs.nrows() {
        return Err(UqError::Numerical(format!(
            "design matrix has {} rows but output matrix has {}",
            design.nrows(),
            outputs.nrows()
        )));
    }
    if design.nrows() < design.ncols() {
        return Err(UqError::InsufficientData {
            survived: design.nrows(),
            required: design.ncols(),
        });
    }

    let svd = design.clone().svd(true, true);
    let largest = svd.singular_values.max();
    let eps = (largest * SVD_RELATIVE_TOLERANCE).max(f64::MIN_POSITIVE);

    svd.solve(outputs, eps)
        .map_err(|e| UqError::Numerical(format!("least squares solve failed: {e}")))
}

/// A fitted expansion for one output quantity.
#[derive(Debug, Clone)]
pub struct ChaosExpansion {
    basis: ChaosBasis,
    coefficients: DMatrix<f64>,
}

impl ChaosExpansion {
    pub fn fit(basis: ChaosBasis, design: &DMatrix<f64>, outputs: &DMatrix<f64>) -> Result<Self> {
        let coefficients = least_squares(design, outputs)?;
        Ok(Self {
            basis,
            coefficients,
        })
    }

    pub fn basis(&self) -> &ChaosBasis {
        &self.basis
    }

    /// `K × m` coefficient matrix.
    pub fn coefficients(&self) -> &DMatrix<f64> {
        &self.coefficients
    }

    /// Number of output columns (time points or feature entries).
    pub fn width(&self) -> usize {
        self.coefficients.ncols()
    }

    /// Mean is the coefficient of the constant term.
    pub fn mean(&self) -> Vec<f64> {
        self.coefficients.row(0).iter().copied().collect()
    }

    pub fn variance(&self) -> Vec<f64> {
        self.weighted_square_sum(|_| true)
    }

    /// First-order Sobol index of germ dimension `dim` for every column.
    pub fn sobol_first(&self, dim: usize) -> Vec<f64> {
        let partial = self.weighted_square_sum(|term| self.basis.is_first_order_term(term, dim));
        self.normalize(partial)
    }

    /// Total Sobol index of germ dimension `dim` for every column.
    pub fn sobol_total(&self, dim: usize) -> Vec<f64> {
        let partial = self.weighted_square_sum(|term| self.basis.involves(term, dim));
        self.normalize(partial)
    }

    /// Evaluate the surrogate at many germ points; returns `points × m`.
    pub fn evaluate<P: AsRef<[f64]>>(&self, germs: &[P]) -> DMatrix<f64> {
        self.basis.design_matrix(germs) * &self.coefficients
    }

    /// `Σ c_k² ‖Φ_k‖²` over non-constant terms selected by `include`.
    fn weighted_square_sum(&self, include: impl Fn(usize) -> bool) -> Vec<f64> {
        let norms = self.basis.squared_norms();
        (0..self.width())
            .map(|col| {
                (1..self.basis.len())
                    .filter(|&term| include(term))
                    .map(|term| self.coefficients[(term, col)].powi(2) * norms[term])
                    .sum()
            })
            .collect()
    }

    /// Divide by the variance. Columns whose variance is round-off relative to
    /// the mean get index 0.
    fn normalize(&self, partial: Vec<f64>) -> Vec<f64> {
        partial
            .into_iter()
            .zip(self.variance())
            .zip(self.mean())
            .map(|((p, v), m)| {
                if v > VARIANCE_FLOOR * (1.0 + m * m) {
                    p / v
                } else {
                    0.0
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaos::PolynomialFamily;

    fn grid(n: usize) -> Vec<Vec<f64>> {
        let step = 2.0 / (n - 1) as f64;
        let mut out = Vec::new();
        for i in 0..n {
            for j in 0..n {
                out.push(vec![-1.0 + step * i as f64, -1.0 + step * j as f64]);
            }
        }
        out
    }

    #[test]
    fn test_recovers_exact_polynomial() {
        // y = 2 + 3 ξ1 + 0.5 ξ1 ξ2, exactly representable with order 2
        let basis = ChaosBasis::total_degree(vec![PolynomialFamily::Legendre; 2], 2);
        let germs = grid(5);
        let design = basis.design_matrix(&germs);
        let outputs = DMatrix::from_iterator(
            germs.len(),
            1,
            germs.iter().map(|g| 2.0 + 3.0 * g[0] + 0.5 * g[0] * g[1]),
        );

        let expansion = ChaosExpansion::fit(basis, &design, &outputs).unwrap();

        assert!((expansion.mean()[0] - 2.0).abs() < 1e-10);
        // Var = 9 * 1/3 + 0.25 * 1/9
        let expected_var = 3.0 + 0.25 / 9.0;
        assert!((expansion.variance()[0] - expected_var).abs() < 1e-10);

        let s1 = expansion.sobol_first(0)[0];
        let s2 = expansion.sobol_first(1)[0];
        let t2 = expansion.sobol_total(1)[0];
        assert!((s1 - 3.0 / expected_var).abs() < 1e-10);
        assert!(s2.abs() < 1e-10);
        assert!((t2 - (0.25 / 9.0) / expected_var).abs() < 1e-10);
    }

    #[test]
    fn test_underdetermined_fit_is_rejected() {
        let basis = ChaosBasis::total_degree(vec![PolynomialFamily::Hermite; 2], 3);
        let germs = vec![vec![0.0, 0.0]; 4];
        let design = basis.design_matrix(&germs);
        let outputs = DMatrix::zeros(4, 1);

        let err = ChaosExpansion::fit(basis, &design, &outputs).unwrap_err();
        assert_eq!(
            err,
            UqError::InsufficientData {
                survived: 4,
                required: 10
            }
        );
    }

    #[test]
    fn test_constant_output_has_zero_indices() {
        let basis = ChaosBasis::total_degree(vec![PolynomialFamily::Legendre; 2], 1);
        let germs = grid(3);
        let design = basis.design_matrix(&germs);
        let outputs = DMatrix::from_element(germs.len(), 2, 7.0);

        let expansion = ChaosExpansion::fit(basis, &design, &outputs).unwrap();
        assert_eq!(expansion.width(), 2);
        assert!(expansion.variance().iter().all(|v| v.abs() < 1e-20));
        assert_eq!(expansion.sobol_first(0), vec![0.0, 0.0]);
    }
}

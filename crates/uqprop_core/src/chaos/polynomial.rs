//! Univariate orthogonal polynomial families.
//!
//! Each family is orthogonal with respect to the probability measure of its
//! germ variable:
//! - Legendre on `U(-1, 1)`
//! - probabilists' Hermite on `N(0, 1)`

use nalgebra::{DMatrix, SymmetricEigen};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolynomialFamily {
    Legendre,
    Hermite,
}

impl PolynomialFamily {
    /// Values of the polynomials of degree `0..=max_degree` at `x`.
    pub fn evaluate_all(self, x: f64, max_degree: usize) -> Vec<f64> {
        let mut values = Vec::with_capacity(max_degree + 1);
        values.push(1.0);
        if max_degree == 0 {
            return values;
        }
        values.push(x);

        for n in 1..max_degree {
            let nf = n as f64;
            let next = match self {
                // (n+1) P_{n+1} = (2n+1) x P_n - n P_{n-1}
                PolynomialFamily::Legendre => {
                    ((2.0 * nf + 1.0) * x * values[n] - nf * values[n - 1]) / (nf + 1.0)
                }
                // He_{n+1} = x He_n - n He_{n-1}
                PolynomialFamily::Hermite => x * values[n] - nf * values[n - 1],
            };
            values.push(next);
        }
        values
    }

    /// Squared norm `E[p_n(ξ)^2]` under the germ measure.
    pub fn squared_norm(self, degree: usize) -> f64 {
        match self {
            PolynomialFamily::Legendre => 1.0 / (2.0 * degree as f64 + 1.0),
            PolynomialFamily::Hermite => (1..=degree).map(|k| k as f64).product(),
        }
    }

    /// Draw one germ value from the family's measure.
    pub fn sample_germ<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        match self {
            PolynomialFamily::Legendre => rng.random_range(-1.0..=1.0),
            PolynomialFamily::Hermite => rng.sample::<f64, _>(StandardNormal),
        }
    }

    /// Gauss quadrature nodes and weights (weights sum to one) for `n` points,
    /// computed by Golub-Welsch from the family's Jacobi matrix.
    pub fn gauss_rule(self, n: usize) -> (Vec<f64>, Vec<f64>) {
        if n == 0 {
            return (Vec::new(), Vec::new());
        }

        let mut jacobi = DMatrix::<f64>::zeros(n, n);
        for k in 1..n {
            let kf = k as f64;
            let beta = match self {
                PolynomialFamily::Legendre => kf / (4.0 * kf * kf - 1.0).sqrt(),
                PolynomialFamily::Hermite => kf.sqrt(),
            };
            jacobi[(k, k - 1)] = beta;
            jacobi[(k - 1, k)] = beta;
        }

        let eigen = SymmetricEigen::new(jacobi);
        let mut rule: Vec<(f64, f64)> = (0..n)
            .map(|i| {
                let v0 = eigen.eigenvectors[(0, i)];
                (eigen.eigenvalues[i], v0 * v0)
            })
            .collect();
        rule.sort_by(|a, b| a.0.total_cmp(&b.0));

        rule.into_iter().unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legendre_values() {
        let v = PolynomialFamily::Legendre.evaluate_all(0.5, 3);
        assert_eq!(v.len(), 4);
        assert!((v[0] - 1.0).abs() < 1e-12);
        assert!((v[1] - 0.5).abs() < 1e-12);
        // P2 = (3x^2 - 1) / 2
        assert!((v[2] - (-0.125)).abs() < 1e-12);
        // P3 = (5x^3 - 3x) / 2
        assert!((v[3] - (-0.4375)).abs() < 1e-12);
    }

    #[test]
    fn test_hermite_values() {
        let v = PolynomialFamily::Hermite.evaluate_all(2.0, 3);
        // He2 = x^2 - 1, He3 = x^3 - 3x
        assert!((v[2] - 3.0).abs() < 1e-12);
        assert!((v[3] - 2.0).abs() < 1e-12);
        assert!((PolynomialFamily::Hermite.squared_norm(3) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_gauss_rule_integrates_norms() {
        // A 4-point rule integrates polynomials up to degree 7 exactly.
        for family in [PolynomialFamily::Legendre, PolynomialFamily::Hermite] {
            let (nodes, weights) = family.gauss_rule(4);
            assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-10);
            assert!(nodes.windows(2).all(|w| w[0] < w[1]));

            for degree in 0..=3 {
                let integral: f64 = nodes
                    .iter()
                    .zip(&weights)
                    .map(|(&x, &w)| w * family.evaluate_all(x, degree)[degree].powi(2))
                    .sum();
                assert!(
                    (integral - family.squared_norm(degree)).abs() < 1e-9,
                    "{family:?} degree {degree}: {integral}"
                );
            }
        }
    }
}

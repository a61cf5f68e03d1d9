//! Multivariate polynomial chaos basis truncated to a total degree.

use nalgebra::DMatrix;

use super::PolynomialFamily;

/// Tensor-product polynomials `Φ_k(ξ) = Π_i p_{α_k[i]}(ξ_i)` for every multi-index
/// `α_k` with `|α_k| <= order`.
///
/// Terms are stored in graded order, so term 0 is always the constant.
#[derive(Debug, Clone)]
pub struct ChaosBasis {
    families: Vec<PolynomialFamily>,
    order: usize,
    indices: Vec<Vec<usize>>,
    norms: Vec<f64>,
}

impl ChaosBasis {
    pub fn total_degree(families: Vec<PolynomialFamily>, order: usize) -> Self {
        let dims = families.len();
        let mut indices = Vec::new();
        for degree in 0..=order {
            indices.extend(compositions(degree, dims));
        }

        let norms: Vec<f64> = indices
            .iter()
            .map(|alpha| {
                alpha
                    .iter()
                    .zip(&families)
                    .map(|(&a, family)| family.squared_norm(a))
                    .product()
            })
            .collect();

        Self {
            families,
            order,
            indices,
            norms,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.families.len()
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn families(&self) -> &[PolynomialFamily] {
        &self.families
    }

    pub fn multi_index(&self, term: usize) -> &[usize] {
        &self.indices[term]
    }

    /// Squared norm of every basis term, in term order.
    pub fn squared_norms(&self) -> &[f64] {
        &self.norms
    }

    /// Evaluate all basis terms at one germ point.
    pub fn evaluate(&self, germ: &[f64]) -> Vec<f64> {
        let univariate: Vec<Vec<f64>> = self
            .families
            .iter()
            .zip(germ)
            .map(|(family, &x)| family.evaluate_all(x, self.order))
            .collect();

        self.indices
            .iter()
            .map(|alpha| {
                alpha
                    .iter()
                    .enumerate()
                    .map(|(dim, &a)| univariate[dim][a])
                    .product()
            })
            .collect()
    }

    /// Design matrix with one row per germ point and one column per term.
    pub fn design_matrix<P: AsRef<[f64]>>(&self, germs: &[P]) -> DMatrix<f64> {
        let mut design = DMatrix::zeros(germs.len(), self.len());
        for (row, germ) in germs.iter().enumerate() {
            for (col, value) in self.evaluate(germ.as_ref()).into_iter().enumerate() {
                design[(row, col)] = value;
            }
        }
        design
    }

    /// Term depends on `dim` and on no other dimension.
    pub fn is_first_order_term(&self, term: usize, dim: usize) -> bool {
        let alpha = &self.indices[term];
        alpha[dim] > 0
            && alpha
                .iter()
                .enumerate()
                .all(|(other, &a)| other == dim || a == 0)
    }

    /// Term depends on `dim` at all.
    pub fn involves(&self, term: usize, dim: usize) -> bool {
        self.indices[term][dim] > 0
    }
}

/// All ways of writing `degree` as an ordered sum of `dims` non-negative parts,
/// highest power on the first dimension first.
fn compositions(degree: usize, dims: usize) -> Vec<Vec<usize>> {
    if dims == 0 {
        return if degree == 0 { vec![Vec::new()] } else { Vec::new() };
    }
    if dims == 1 {
        return vec![vec![degree]];
    }

    let mut out = Vec::new();
    for first in (0..=degree).rev() {
        for mut rest in compositions(degree - first, dims - 1) {
            rest.insert(0, first);
            out.push(rest);
        }
    }
    out
}

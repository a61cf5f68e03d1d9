//! Germ-space point sets used as regression nodes.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::PolynomialFamily;

/// How collocation points are placed in germ space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollocationRule {
    /// Pseudo-random draws from the germ measure.
    #[default]
    Random,
    /// Tensor grid of Gauss nodes, `order + 1` per dimension. The requested
    /// sample count is ignored.
    Quadrature,
}

impl CollocationRule {
    pub fn germ_points<R: Rng + ?Sized>(
        self,
        families: &[PolynomialFamily],
        order: usize,
        count: usize,
        rng: &mut R,
    ) -> Vec<Vec<f64>> {
        match self {
            CollocationRule::Random => (0..count)
                .map(|_| families.iter().map(|f| f.sample_germ(rng)).collect())
                .collect(),
            CollocationRule::Quadrature => tensor_grid(families, order + 1),
        }
    }
}

fn tensor_grid(families: &[PolynomialFamily], nodes_per_dim: usize) -> Vec<Vec<f64>> {
    let axes: Vec<Vec<f64>> = families
        .iter()
        .map(|f| f.gauss_rule(nodes_per_dim).0)
        .collect();

    let mut points: Vec<Vec<f64>> = vec![Vec::with_capacity(families.len())];
    for axis in &axes {
        points = points
            .into_iter()
            .flat_map(|prefix| {
                axis.iter().map(move |&node| {
                    let mut point = prefix.clone();
                    point.push(node);
                    point
                })
            })
            .collect();
    }
    points
}

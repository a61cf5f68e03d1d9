//! Column-wise sample statistics over output matrices.
//!
//! Rows are samples, columns are time points (or entries of a feature).

use nalgebra::DMatrix;

/// Linearly interpolated percentile of already sorted data, `level` in `[0, 1]`.
pub fn percentile_sorted(sorted: &[f64], level: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = level.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

pub fn column_means(samples: &DMatrix<f64>) -> Vec<f64> {
    let n = samples.nrows() as f64;
    samples.column_iter().map(|col| col.sum() / n).collect()
}

/// Population variance (divisor `n`) of each column.
pub fn column_variances(samples: &DMatrix<f64>) -> Vec<f64> {
    let n = samples.nrows() as f64;
    samples
        .column_iter()
        .map(|col| {
            let mean = col.sum() / n;
            col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
        })
        .collect()
}

/// One series per level, each with one value per column.
pub fn column_percentiles(samples: &DMatrix<f64>, levels: &[f64]) -> Vec<Vec<f64>> {
    let sorted_columns: Vec<Vec<f64>> = samples
        .column_iter()
        .map(|col| {
            let mut values: Vec<f64> = col.iter().copied().collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values
        })
        .collect();

    levels
        .iter()
        .map(|&level| {
            sorted_columns
                .iter()
                .map(|col| percentile_sorted(col, level))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_sorted(&data, 0.0), 1.0);
        assert_eq!(percentile_sorted(&data, 1.0), 4.0);
        assert!((percentile_sorted(&data, 0.5) - 2.5).abs() < 1e-12);
        assert!((percentile_sorted(&data, 0.05) - 1.15).abs() < 1e-12);
        assert!(percentile_sorted(&[], 0.5).is_nan());
    }

    #[test]
    fn test_column_statistics() {
        let samples = DMatrix::from_row_slice(4, 2, &[1.0, 5.0, 2.0, 5.0, 3.0, 5.0, 4.0, 5.0]);

        assert_eq!(column_means(&samples), vec![2.5, 5.0]);
        assert_eq!(column_variances(&samples), vec![1.25, 0.0]);

        let bands = column_percentiles(&samples, &[0.5]);
        assert_eq!(bands, vec![vec![2.5, 5.0]]);
    }
}

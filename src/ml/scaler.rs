//! Z-score feature standardization

use anyhow::Result;
use serde::{Deserialize, Serialize};


/// Per-feature mean and scale fitted on a training matrix
///
/// Features with (near) zero variance get a scale of 1 so they pass through
/// centred rather than blowing up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit on row-major training data
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            anyhow::bail!("Cannot fit scaler on empty dataset");
        };
        let n_features = first.len();
        if rows.iter().any(|row| row.len() != n_features) {
            anyhow::bail!("All feature vectors must have the same length");
        }

        let n = rows.len() as f64;
        let mut means = vec![0.0; n_features];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value / n;
            }
        }

        let mut variances = vec![0.0; n_features];
        for row in rows {
            for ((var, value), mean) in variances.iter_mut().zip(row).zip(&means) {
                *var += (value - mean).powi(2) / n;
            }
        }

        let scales = variances
            .into_iter()
            .map(|var| {
                let std = var.sqrt();
                if std < 1e-10 {
                    1.0
                } else {
                    std
                }
            })
            .collect();

        Ok(Self { means, scales })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.means.len() {
            anyhow::bail!(
                "Standardization parameter count mismatch: expected {}, got {}",
                self.means.len(),
                row.len()
            );
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect())
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_statistics() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();

        assert_eq!(scaler.means, vec![2.0, 10.0]);
        // Population std of [1, 3] is 1; constant column falls back to 1
        assert_eq!(scaler.scales, vec![1.0, 1.0]);
    }

    #[test]
    fn test_transform_zero_mean_unit_variance() {
        let rows = vec![vec![2.0], vec![4.0], vec![6.0], vec![8.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled = scaler.transform(&rows).unwrap();

        let values: Vec<f64> = scaled.iter().map(|r| r[0]).collect();
        let mean = values.iter().sum::<f64>() / 4.0;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_rejects_wrong_width() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0]]).unwrap();
        assert!(scaler.transform_row(&[1.0]).is_err());
    }

    #[test]
    fn test_fit_rejects_empty_or_ragged() {
        assert!(StandardScaler::fit(&[]).is_err());
        assert!(StandardScaler::fit(&[vec![1.0, 2.0], vec![1.0]]).is_err());
    }
}

use crate::error::{ForecastError, Result};

/// Standardizes each feature to zero mean and unit variance, using the
/// population standard deviation. Constant features are only centered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, features: &[Vec<f64>]) -> Result<()> {
        let width = super::check_training_data(features, &vec![0.0; features.len()])?;
        let n = features.len() as f64;

        self.means = (0..width)
            .map(|j| features.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();

        self.scales = (0..width)
            .map(|j| {
                let mean = self.means[j];
                let variance = features
                    .iter()
                    .map(|row| (row[j] - mean).powi(2))
                    .sum::<f64>()
                    / n;
                let std = variance.sqrt();
                if std > f64::EPSILON * mean.abs().max(1.0) {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(())
    }

    pub fn fit_transform(&mut self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.fit(features)?;
        self.transform(features)
    }

    pub fn transform(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        features.iter().map(|row| self.transform_row(row)).collect()
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if self.means.is_empty() {
            return Err(ForecastError::NotFitted("StandardScaler".to_string()));
        }
        if row.len() != self.means.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.means.len(),
                actual: row.len(),
            });
        }

        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}

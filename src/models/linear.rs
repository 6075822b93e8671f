use super::{check_training_data, Regressor};
use crate::error::{ForecastError, Result};
use nalgebra::{DMatrix, DVector};

/// Singular values below this fraction of the largest are treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Ordinary least squares with an intercept.
///
/// Solved by SVD of the centered design matrix, so collinear or constant
/// features get the minimum-norm coefficients instead of failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearRegression {
    coefficients: Vec<f64>,
    intercept: f64,
    fitted: bool,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        let width = check_training_data(features, targets)?;
        let rows = features.len();
        let n = rows as f64;

        let x_means: Vec<f64> = (0..width)
            .map(|j| features.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let y_mean = targets.iter().sum::<f64>() / n;

        let coefficients = if width == 0 {
            Vec::new()
        } else {
            let design = DMatrix::from_fn(rows, width, |i, j| features[i][j] - x_means[j]);
            let response = DVector::from_iterator(rows, targets.iter().map(|y| y - y_mean));
            minimum_norm_solve(design, &response)?
        };

        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_means)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        self.coefficients = coefficients;
        self.intercept = intercept;
        self.fitted = true;
        Ok(())
    }

    fn predict_one(&self, features: &[f64]) -> Result<f64> {
        if !self.fitted {
            return Err(ForecastError::NotFitted("Linear Regression".to_string()));
        }
        if features.len() != self.coefficients.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }

        Ok(self.intercept
            + features
                .iter()
                .zip(&self.coefficients)
                .map(|(x, c)| x * c)
                .sum::<f64>())
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}

/// Minimum-norm least-squares solution of `design * x = response`.
fn minimum_norm_solve(design: DMatrix<f64>, response: &DVector<f64>) -> Result<Vec<f64>> {
    let svd = design.svd(true, true);
    let cutoff = svd.singular_values.max() * RANK_TOLERANCE;

    let solution = svd
        .solve(response, cutoff)
        .map_err(|e| ForecastError::TrainingError {
            category: "Linear Regression".to_string(),
            details: e.to_string(),
        })?;

    Ok(solution.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_exact_plane() {
        let features: Vec<Vec<f64>> = (0..10)
            .map(|i| vec![i as f64, ((i * 7) % 5) as f64])
            .collect();
        let targets: Vec<f64> = features.iter().map(|r| 3.0 + 2.0 * r[0] - 0.5 * r[1]).collect();

        let mut model = LinearRegression::new();
        model.fit(&features, &targets).unwrap();

        assert!((model.intercept() - 3.0).abs() < 1e-9);
        assert!((model.coefficients()[0] - 2.0).abs() < 1e-9);
        assert!((model.coefficients()[1] + 0.5).abs() < 1e-9);
        assert!((model.predict_one(&[20.0, 1.0]).unwrap() - 42.5).abs() < 1e-9);
    }

    #[test]
    fn test_constant_feature_gets_zero_weight() {
        let features: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64, 0.0]).collect();
        let targets: Vec<f64> = (0..6).map(|i| 10.0 + i as f64).collect();

        let mut model = LinearRegression::new();
        model.fit(&features, &targets).unwrap();

        assert!((model.coefficients()[0] - 1.0).abs() < 1e-9);
        assert!(model.coefficients()[1].abs() < 1e-12);
    }

    #[test]
    fn test_duplicated_feature_splits_weight_evenly() {
        let features: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64, i as f64]).collect();
        let targets: Vec<f64> = (0..5).map(|i| 2.0 * i as f64).collect();

        let mut model = LinearRegression::new();
        model.fit(&features, &targets).unwrap();

        assert!((model.coefficients()[0] - 1.0).abs() < 1e-9);
        assert!((model.coefficients()[1] - 1.0).abs() < 1e-9);
        assert!((model.predict_one(&[7.0, 7.0]).unwrap() - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_nearly_collinear_features_keep_small_direction() {
        let features: Vec<Vec<f64>> = (0..20)
            .map(|i| {
                let x = i as f64;
                vec![x, x + 1e-4 * (i % 2) as f64]
            })
            .collect();
        let targets: Vec<f64> = features.iter().map(|r| 1e4 * (r[1] - r[0])).collect();

        let mut model = LinearRegression::new();
        model.fit(&features, &targets).unwrap();

        let worst = features
            .iter()
            .zip(&targets)
            .map(|(row, y)| (model.predict_one(row).unwrap() - y).abs())
            .fold(0.0f64, f64::max);
        assert!(worst < 1e-6, "largest residual {}", worst);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = LinearRegression::new();
        assert!(model.predict_one(&[1.0]).is_err());
        assert!(!model.is_fitted());
    }
}

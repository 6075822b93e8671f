//! Regressors competing for each expense column, plus the feature scaler and
//! the metrics used to pick between them.

pub mod forest;
pub mod linear;
pub mod metrics;
pub mod scaler;

pub use forest::RandomForestRegressor;
pub use linear::LinearRegression;
pub use metrics::{evaluate, mean_absolute_error, r2_score, root_mean_squared_error};
pub use scaler::StandardScaler;

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub trait Regressor: Debug + Send + Sync {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<()>;

    fn predict_one(&self, features: &[f64]) -> Result<f64>;

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>> {
        features.iter().map(|row| self.predict_one(row)).collect()
    }

    fn is_fitted(&self) -> bool;
}

/// The candidates, in declared order. On equal RMSE the earlier one is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateKind {
    LinearRegression,
    RandomForest,
}

impl CandidateKind {
    pub const ORDERED: [CandidateKind; 2] =
        [CandidateKind::LinearRegression, CandidateKind::RandomForest];

    pub fn name(&self) -> &'static str {
        match self {
            CandidateKind::LinearRegression => "Linear Regression",
            CandidateKind::RandomForest => "Random Forest",
        }
    }

    pub fn build(&self, config: &ForecastConfig) -> Box<dyn Regressor> {
        match self {
            CandidateKind::LinearRegression => Box::new(LinearRegression::new()),
            CandidateKind::RandomForest => {
                Box::new(RandomForestRegressor::new(config.n_trees, config.random_seed))
            }
        }
    }
}

pub(crate) fn check_training_data(features: &[Vec<f64>], targets: &[f64]) -> Result<usize> {
    if features.is_empty() {
        return Err(ForecastError::DimensionMismatch {
            expected: 1,
            actual: 0,
        });
    }

    if features.len() != targets.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: features.len(),
            actual: targets.len(),
        });
    }

    let width = features[0].len();
    if let Some(row) = features.iter().find(|row| row.len() != width) {
        return Err(ForecastError::DimensionMismatch {
            expected: width,
            actual: row.len(),
        });
    }

    Ok(width)
}

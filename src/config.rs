use crate::error::{ForecastError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tunables for one pipeline run. `Default` reproduces the reference behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ForecastConfig {
    #[schemars(description = "Rows required before anything is trained (default 12)")]
    pub min_history_months: usize,

    #[schemars(description = "Below this many rows a short-history warning is emitted (default 24)")]
    pub recommended_history_months: usize,

    #[schemars(description = "Largest accepted forecast horizon in months (default 24)")]
    pub max_horizon: usize,

    #[schemars(description = "Chronological share of rows used for training (default 0.8)")]
    pub train_ratio: f64,

    #[schemars(description = "Trees in the random forest candidate (default 100)")]
    pub n_trees: usize,

    #[schemars(description = "Seed for the random forest bootstrap (default 42)")]
    pub random_seed: u64,

    #[schemars(
        description = "Weight of the model prediction in the blend; the trend gets the rest (default 0.3)"
    )]
    pub model_weight: f64,

    #[schemars(description = "Forecast floor as a multiple of the last actual value (default 0.5)")]
    pub lower_bound_ratio: f64,

    #[schemars(description = "Forecast ceiling as a multiple of the last actual value (default 2.0)")]
    pub upper_bound_ratio: f64,

    #[schemars(description = "Most recent actuals used for the trend line (default 12)")]
    pub trend_window: usize,

    #[schemars(description = "Most recent actuals used for the compound growth fallback (default 6)")]
    pub growth_window: usize,

    #[schemars(description = "A value above median times this multiplier is an outlier (default 10)")]
    pub outlier_multiplier: f64,

    #[schemars(description = "Allowed deviation in days from a one-month step (default 5)")]
    pub gap_tolerance_days: i64,

    #[schemars(description = "Relative Total tolerance against the category sum (default 0.01)")]
    pub total_relative_tolerance: f64,

    #[schemars(description = "Absolute Total tolerance against the category sum (default 100)")]
    pub total_absolute_tolerance: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_history_months: 12,
            recommended_history_months: 24,
            max_horizon: 24,
            train_ratio: 0.8,
            n_trees: 100,
            random_seed: 42,
            model_weight: 0.3,
            lower_bound_ratio: 0.5,
            upper_bound_ratio: 2.0,
            trend_window: 12,
            growth_window: 6,
            outlier_multiplier: 10.0,
            gap_tolerance_days: 5,
            total_relative_tolerance: 0.01,
            total_absolute_tolerance: 100.0,
        }
    }
}

impl ForecastConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_history_months < 2 {
            return Err(invalid(format!(
                "min_history_months must be at least 2, got {}",
                self.min_history_months
            )));
        }

        if self.max_horizon == 0 {
            return Err(invalid("max_horizon must be positive".to_string()));
        }

        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(invalid(format!(
                "train_ratio must be strictly between 0.0 and 1.0, got {}",
                self.train_ratio
            )));
        }

        if self.n_trees == 0 {
            return Err(invalid("n_trees must be positive".to_string()));
        }

        if !(0.0..=1.0).contains(&self.model_weight) {
            return Err(invalid(format!(
                "model_weight must be between 0.0 and 1.0, got {}",
                self.model_weight
            )));
        }

        if !(self.lower_bound_ratio >= 0.0 && self.lower_bound_ratio <= self.upper_bound_ratio) {
            return Err(invalid(format!(
                "bound ratios must satisfy 0 <= lower ({}) <= upper ({})",
                self.lower_bound_ratio, self.upper_bound_ratio
            )));
        }

        if self.trend_window == 0 || self.growth_window == 0 {
            return Err(invalid("trend_window and growth_window must be positive".to_string()));
        }

        if self.outlier_multiplier <= 0.0 {
            return Err(invalid(format!(
                "outlier_multiplier must be positive, got {}",
                self.outlier_multiplier
            )));
        }

        if self.gap_tolerance_days < 0 {
            return Err(invalid(format!(
                "gap_tolerance_days must not be negative, got {}",
                self.gap_tolerance_days
            )));
        }

        if self.total_relative_tolerance < 0.0 || self.total_absolute_tolerance < 0.0 {
            return Err(invalid("Total tolerances must not be negative".to_string()));
        }

        Ok(())
    }
}

fn invalid(details: String) -> ForecastError {
    ForecastError::InvalidConfig(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ForecastConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model_weight, 0.3);
        assert_eq!(config.lower_bound_ratio, 0.5);
        assert_eq!(config.upper_bound_ratio, 2.0);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config = ForecastConfig::from_json(r#"{ "n_trees": 10, "random_seed": 7 }"#).unwrap();
        assert_eq!(config.n_trees, 10);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.min_history_months, 12);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = ForecastConfig {
            train_ratio: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidConfig(_))
        ));

        let config = ForecastConfig {
            lower_bound_ratio: 3.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(ForecastConfig::from_json(r#"{ "n_trees": 0 }"#).is_err());
    }
}

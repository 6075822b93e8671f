use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::features::TemporalFeatures;
use crate::schema::ExpenseColumn;
use crate::trainer::CategoryModel;
use crate::utils::{least_squares_slope, mean};
use log::debug;

/// Blends a trained model with a linear trend over the latest actuals and
/// keeps every step inside a band around the last actual value.
pub struct ForecastGenerator<'a> {
    config: &'a ForecastConfig,
}

impl<'a> ForecastGenerator<'a> {
    pub fn new(config: &'a ForecastConfig) -> Self {
        Self { config }
    }

    /// Forecasts `horizon` months after `last_features` for one column.
    ///
    /// `history` holds the column's actuals in chronological order. The band
    /// is anchored on the final actual for every step.
    pub fn generate(
        &self,
        column: ExpenseColumn,
        history: &[f64],
        model: &CategoryModel,
        last_features: &TemporalFeatures,
        horizon: usize,
    ) -> Result<Vec<f64>> {
        let last_value = *history.last().ok_or_else(|| ForecastError::ForecastFailed {
            category: column.to_string(),
            details: "no historical values".to_string(),
        })?;
        let slope = trend_slope(history, self.config.trend_window);

        debug!(
            "{}: last value {:.2}, trend slope {:.4}, horizon {}",
            column, last_value, slope, horizon
        );

        (1..=horizon)
            .map(|step| {
                let features = last_features.advance(step as u32);
                let prediction = model.predict(&features)?;
                let trend = last_value + slope * step as f64;
                let value = self.blend(prediction, trend, last_value);

                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(ForecastError::ForecastFailed {
                        category: column.to_string(),
                        details: format!("non-finite forecast at step {}", step),
                    })
                }
            })
            .collect()
    }

    /// Weighted blend, floored then capped relative to `last_value`.
    ///
    /// Applied as max-then-min, so when the bounds invert (negative
    /// `last_value`) the cap wins.
    pub fn blend(&self, prediction: f64, trend: f64, last_value: f64) -> f64 {
        let weight = self.config.model_weight;
        let combined = weight * prediction + (1.0 - weight) * trend;
        if !combined.is_finite() {
            return combined;
        }

        let floor = self.config.lower_bound_ratio * last_value;
        let cap = self.config.upper_bound_ratio * last_value;
        combined.max(floor).min(cap)
    }
}

/// Least-squares slope over the last `window` values; 0 with fewer than two.
pub fn trend_slope(history: &[f64], window: usize) -> f64 {
    let start = history.len().saturating_sub(window);
    least_squares_slope(&history[start..])
}

/// Mean month-over-month percentage change across the last `window` values.
/// Changes from a zero base are skipped.
pub fn mean_growth_rate(history: &[f64], window: usize) -> f64 {
    let start = history.len().saturating_sub(window);
    let recent = &history[start..];

    let changes: Vec<f64> = recent
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .filter(|change| change.is_finite())
        .collect();

    mean(&changes).unwrap_or(0.0)
}

/// Compound growth projection used for columns without a usable model.
pub fn growth_projection(history: &[f64], window: usize, horizon: usize) -> Vec<f64> {
    let Some(&last) = history.last() else {
        return vec![0.0; horizon];
    };
    let rate = mean_growth_rate(history, window);

    (1..=horizon)
        .map(|step| {
            let value = last * (1.0 + rate).powi(step as i32);
            if value.is_finite() {
                value.max(0.0)
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureBuilder;
    use crate::schema::{TimePoint, ValidatedSeries};
    use crate::trainer::CategoryModelTrainer;
    use crate::utils::add_months;
    use chrono::NaiveDate;

    fn linear_series() -> ValidatedSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let points = (0..24)
            .map(|i| {
                let value = 100.0 + 10.0 * i as f64;
                TimePoint {
                    month: add_months(start, i).unwrap(),
                    category_values: ExpenseColumn::CATEGORIES
                        .iter()
                        .map(|c| (*c, value))
                        .collect(),
                    total: value * 5.0,
                }
            })
            .collect();
        ValidatedSeries::new(points)
    }

    #[test]
    fn test_generate_follows_exact_trend() {
        let config = ForecastConfig::default();
        let series = linear_series();
        let outcome = CategoryModelTrainer::new(&config).train_all(&series);
        let model = &outcome.models[&ExpenseColumn::Miscellaneous];
        let last = *FeatureBuilder::build(&series).last().unwrap();

        let history = series.values(ExpenseColumn::Miscellaneous);
        let forecast = ForecastGenerator::new(&config)
            .generate(ExpenseColumn::Miscellaneous, &history, model, &last, 3)
            .unwrap();

        assert_eq!(forecast.len(), 3);
        for (step, value) in forecast.iter().enumerate() {
            let expected = 330.0 + 10.0 * (step + 1) as f64;
            assert!((value - expected).abs() < 1e-6, "{} vs {}", value, expected);
        }
    }

    #[test]
    fn test_generate_stays_in_band_over_long_horizon() {
        let config = ForecastConfig::default();
        let series = linear_series();
        let outcome = CategoryModelTrainer::new(&config).train_all(&series);
        let model = &outcome.models[&ExpenseColumn::Operating];
        let last = *FeatureBuilder::build(&series).last().unwrap();

        let history = series.values(ExpenseColumn::Operating);
        let forecast = ForecastGenerator::new(&config)
            .generate(ExpenseColumn::Operating, &history, model, &last, 24)
            .unwrap();

        assert_eq!(forecast.len(), 24);
        assert!(forecast.iter().all(|v| (165.0..=660.0).contains(v)));
    }

    #[test]
    fn test_blend_weights_and_bounds() {
        let config = ForecastConfig::default();
        let generator = ForecastGenerator::new(&config);

        assert!((generator.blend(200.0, 100.0, 100.0) - 130.0).abs() < 1e-9);
        assert_eq!(generator.blend(1000.0, 100.0, 100.0), 200.0);
        assert_eq!(generator.blend(0.0, 0.0, 100.0), 50.0);
    }

    #[test]
    fn test_blend_with_negative_last_value_takes_cap() {
        let config = ForecastConfig::default();
        let generator = ForecastGenerator::new(&config);

        assert_eq!(generator.blend(-100.0, -100.0, -100.0), -200.0);
        assert_eq!(generator.blend(500.0, 10.0, -100.0), -200.0);
    }

    #[test]
    fn test_trend_slope_uses_recent_window() {
        let mut history = vec![1000.0, 0.0, 1000.0];
        history.extend((0..12).map(|i| 5.0 * i as f64));
        assert!((trend_slope(&history, 12) - 5.0).abs() < 1e-9);
        assert_eq!(trend_slope(&[42.0], 12), 0.0);
    }

    #[test]
    fn test_growth_projection_compounds() {
        let projection = growth_projection(&[100.0, 110.0, 121.0], 6, 2);
        assert!((projection[0] - 133.1).abs() < 1e-9);
        assert!((projection[1] - 146.41).abs() < 1e-9);
    }

    #[test]
    fn test_growth_skips_zero_base_and_floors_at_zero() {
        assert!((mean_growth_rate(&[0.0, 50.0, 100.0], 6) - 1.0).abs() < 1e-12);
        assert_eq!(growth_projection(&[-50.0, -100.0], 6, 2), vec![0.0, 0.0]);
        assert_eq!(growth_projection(&[], 6, 3), vec![0.0; 3]);
        assert_eq!(mean_growth_rate(&[0.0, 0.0, 0.0], 6), 0.0);
    }

    #[test]
    fn test_growth_window_limits_history() {
        let history = [1.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0];
        assert_eq!(mean_growth_rate(&history, 6), 0.0);
        assert_eq!(growth_projection(&history, 6, 2), vec![100.0, 100.0]);
    }
}

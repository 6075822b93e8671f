use crate::balancer::TotalBalancer;
use crate::config::ForecastConfig;
use crate::engine::{growth_projection, ForecastGenerator};
use crate::error::{ForecastError, Result};
use crate::features::FeatureBuilder;
use crate::schema::{
    ExpenseColumn, ForecastPoint, ForecastResult, PerformanceTable, ValidatedSeries,
};
use crate::trainer::TrainingOutcome;
use crate::utils::add_months;
use log::{info, warn};
use std::collections::BTreeMap;

pub struct ForecastAssembler<'a> {
    config: &'a ForecastConfig,
}

impl<'a> ForecastAssembler<'a> {
    pub fn new(config: &'a ForecastConfig) -> Self {
        Self { config }
    }

    /// Builds `horizon` future points from the trained models.
    ///
    /// Categories without a model, or whose generator fails, are projected by
    /// compound growth and listed in `category_failures`. Total is always the
    /// category sum.
    pub fn assemble(
        &self,
        series: &ValidatedSeries,
        training: &TrainingOutcome,
        horizon: usize,
    ) -> Result<ForecastResult> {
        let no_history =
            || ForecastError::DateError("No historical months to forecast from".to_string());
        let last_month = series.last_month().ok_or_else(no_history)?;
        let last_features = FeatureBuilder::build(series)
            .last()
            .copied()
            .ok_or_else(no_history)?;

        let months = (1..=horizon)
            .map(|step| add_months(last_month, step as u32))
            .collect::<Result<Vec<_>>>()?;

        let generator = ForecastGenerator::new(self.config);
        let mut failures = training.failures.clone();
        let mut forecasts: BTreeMap<ExpenseColumn, Vec<f64>> = BTreeMap::new();

        for category in ExpenseColumn::CATEGORIES {
            let history = series.values(category);

            let generated = match training.models.get(&category) {
                Some(model) => {
                    match generator.generate(category, &history, model, &last_features, horizon) {
                        Ok(values) => Some(values),
                        Err(e) => {
                            warn!("{}: {}; using growth projection", category, e);
                            failures.insert(category, e.to_string());
                            None
                        }
                    }
                }
                None => None,
            };

            let values = generated.unwrap_or_else(|| {
                growth_projection(&history, self.config.growth_window, horizon)
            });
            forecasts.insert(category, values);
        }

        let mut points: Vec<ForecastPoint> = months
            .into_iter()
            .enumerate()
            .map(|(step, month)| ForecastPoint {
                month,
                category_values: forecasts
                    .iter()
                    .map(|(category, values)| (*category, values[step]))
                    .collect(),
                total: 0.0,
            })
            .collect();

        let balancer = TotalBalancer::new(
            self.config.total_relative_tolerance,
            self.config.total_absolute_tolerance,
        );
        balancer.enforce(&mut points);
        balancer.verify(&points)?;

        let performance: PerformanceTable = training
            .models
            .iter()
            .map(|(column, model)| (*column, model.performance()))
            .collect();
        let selected_models = training
            .models
            .iter()
            .map(|(column, model)| (*column, model.selected_name().to_string()))
            .collect();

        info!(
            "Assembled {} forecast months ({} fallback columns)",
            points.len(),
            failures.len()
        );

        Ok(ForecastResult {
            points,
            performance,
            selected_models,
            category_failures: failures,
        })
    }
}

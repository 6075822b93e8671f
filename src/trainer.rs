use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureBuilder, TemporalFeatures};
use crate::models::{evaluate, CandidateKind, Regressor, StandardScaler};
use crate::schema::{ExpenseColumn, ModelMetrics, ValidatedSeries};
use log::{debug, info, warn};
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct CandidateFit {
    pub kind: CandidateKind,
    pub model: Box<dyn Regressor>,
    pub metrics: ModelMetrics,
}

/// Everything learned for one column: its scaler, both candidates and which
/// of them was selected.
#[derive(Debug)]
pub struct CategoryModel {
    pub column: ExpenseColumn,
    pub scaler: StandardScaler,
    pub candidates: Vec<CandidateFit>,
    selected: usize,
}

impl CategoryModel {
    pub fn selected(&self) -> &CandidateFit {
        &self.candidates[self.selected]
    }

    pub fn selected_name(&self) -> &'static str {
        self.selected().kind.name()
    }

    pub fn best_rmse(&self) -> f64 {
        self.selected().metrics.rmse
    }

    /// Prediction of the selected candidate for unscaled features.
    pub fn predict(&self, features: &TemporalFeatures) -> Result<f64> {
        let scaled = self.scaler.transform_row(&features.to_vec())?;
        self.selected().model.predict_one(&scaled)
    }

    /// Rounded metrics per candidate name.
    pub fn performance(&self) -> BTreeMap<String, ModelMetrics> {
        self.candidates
            .iter()
            .map(|c| (c.kind.name().to_string(), c.metrics.rounded()))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct TrainingOutcome {
    pub models: BTreeMap<ExpenseColumn, CategoryModel>,
    pub failures: BTreeMap<ExpenseColumn, String>,
}

pub struct CategoryModelTrainer<'a> {
    config: &'a ForecastConfig,
}

impl<'a> CategoryModelTrainer<'a> {
    pub fn new(config: &'a ForecastConfig) -> Self {
        Self { config }
    }

    /// Trains every category plus Total. A failing column is recorded and
    /// the others still train.
    pub fn train_all(&self, series: &ValidatedSeries) -> TrainingOutcome {
        let features = FeatureBuilder::matrix(&FeatureBuilder::build(series));
        let mut outcome = TrainingOutcome::default();

        for column in ExpenseColumn::ALL {
            let targets = series.values(column);
            match self.train_column(column, &features, &targets) {
                Ok(model) => {
                    info!(
                        "{}: selected {} (RMSE {:.2})",
                        column,
                        model.selected_name(),
                        model.best_rmse()
                    );
                    outcome.models.insert(column, model);
                }
                Err(e) => {
                    warn!("{}: training failed: {}", column, e);
                    outcome.failures.insert(column, e.to_string());
                }
            }
        }

        outcome
    }

    pub fn train_column(
        &self,
        column: ExpenseColumn,
        features: &[Vec<f64>],
        targets: &[f64],
    ) -> Result<CategoryModel> {
        let fail = |details: String| ForecastError::TrainingError {
            category: column.to_string(),
            details,
        };

        let n = features.len().min(targets.len());
        let split = (n as f64 * self.config.train_ratio).floor() as usize;
        if split < 2 || split >= n {
            return Err(fail(format!(
                "{} rows cannot be split into training and test sets",
                n
            )));
        }

        let (x_train, x_test) = features[..n].split_at(split);
        let (y_train, y_test) = targets[..n].split_at(split);

        let mut scaler = StandardScaler::new();
        let x_train = scaler.fit_transform(x_train)?;
        let x_test = scaler.transform(x_test)?;

        let mut candidates: Vec<CandidateFit> =
            Vec::with_capacity(CandidateKind::ORDERED.len());
        let mut selected: Option<usize> = None;

        for kind in CandidateKind::ORDERED {
            let mut model = kind.build(self.config);
            model.fit(&x_train, y_train)?;
            let predictions = model.predict(&x_test)?;
            let metrics = evaluate(y_test, &predictions)?;

            debug!(
                "{} / {}: MAE {:.2}, RMSE {:.2}, R² {:.4}",
                column,
                kind.name(),
                metrics.mae,
                metrics.rmse,
                metrics.r2
            );

            if !metrics.rmse.is_finite() {
                return Err(fail(format!("{} produced a non-finite RMSE", kind.name())));
            }

            // Strictly lower only: on a tie the earlier candidate stays.
            let improves = selected
                .map(|idx: usize| metrics.rmse < candidates[idx].metrics.rmse)
                .unwrap_or(true);
            candidates.push(CandidateFit {
                kind,
                model,
                metrics,
            });
            if improves {
                selected = Some(candidates.len() - 1);
            }
        }

        let selected = selected.ok_or_else(|| fail("no candidate models".to_string()))?;

        Ok(CategoryModel {
            column,
            scaler,
            candidates,
            selected,
        })
    }
}

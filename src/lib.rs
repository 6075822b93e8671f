//! # Expense Forecaster
//!
//! A library for forecasting monthly expenses per category from a short
//! tabular history.
//!
//! ## Core Concepts
//!
//! - **Categories**: Miscellaneous, Financial, CapEx, COGS and Operating, plus the
//!   derived Total column
//! - **Validation Report**: fatal errors, non-fatal warnings and a data summary for
//!   every run
//! - **Model Selection**: each column trains a linear regression and a random forest on
//!   calendar features and keeps the one with the lower test RMSE
//! - **Hybrid Forecast**: 30% model, 70% linear trend, kept between half and double the
//!   last actual value
//! - **Total Integrity**: forecast Total is always the sum of the category forecasts
//!
//! ## Example
//!
//! ```rust,ignore
//! use expense_forecaster::*;
//!
//! let outcome = ExpenseForecastPipeline::new(ForecastConfig::default())?
//!     .run_csv("expenses.csv", 6)?;
//!
//! for warning in &outcome.report.warnings {
//!     println!("warning: {}", warning);
//! }
//!
//! if let Some(result) = outcome.result {
//!     print!("{}", result.to_csv());
//! }
//! ```

pub mod assembler;
pub mod balancer;
pub mod cleaning;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod ingestion;
pub mod models;
pub mod processor;
pub mod quality;
pub mod schema;
pub mod trainer;
pub mod utils;
pub mod validation;

pub use assembler::ForecastAssembler;
pub use balancer::{reconcile_totals, verify_totals, CategoryTotals, TotalBalancer};
pub use cleaning::{CleanedData, CleanedRow, DataCleaner};
pub use config::ForecastConfig;
pub use engine::{growth_projection, mean_growth_rate, trend_slope, ForecastGenerator};
pub use error::{ForecastError, Result};
pub use features::{FeatureBuilder, TemporalFeatures};
pub use ingestion::{load_csv, read_csv};
pub use models::{CandidateKind, LinearRegression, RandomForestRegressor, Regressor, StandardScaler};
pub use processor::DataProcessor;
pub use quality::{QualityAudit, QualityAuditor};
pub use schema::*;
pub use trainer::{CandidateFit, CategoryModel, CategoryModelTrainer, TrainingOutcome};
pub use validation::SchemaValidator;

use log::{debug, info};
use std::path::Path;

/// State owned by a single forecast: the validated history and the models
/// trained on it. Never shared between calls.
#[derive(Debug)]
pub struct PipelineRun<'a> {
    config: &'a ForecastConfig,
    series: ValidatedSeries,
    training: TrainingOutcome,
}

impl<'a> PipelineRun<'a> {
    pub fn train(config: &'a ForecastConfig, series: ValidatedSeries) -> Self {
        debug!("Training models on {} months", series.len());
        let training = CategoryModelTrainer::new(config).train_all(&series);
        Self {
            config,
            series,
            training,
        }
    }

    pub fn series(&self) -> &ValidatedSeries {
        &self.series
    }

    pub fn training(&self) -> &TrainingOutcome {
        &self.training
    }

    pub fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        ForecastAssembler::new(self.config).assemble(&self.series, &self.training, horizon)
    }
}

pub struct ExpenseForecastPipeline {
    config: ForecastConfig,
}

impl ExpenseForecastPipeline {
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn check_horizon(&self, horizon: usize) -> Result<()> {
        if horizon == 0 || horizon > self.config.max_horizon {
            return Err(ForecastError::InvalidHorizon {
                horizon,
                max: self.config.max_horizon,
            });
        }
        Ok(())
    }

    /// Validates, trains and forecasts `horizon` months.
    ///
    /// An invalid dataset is not an `Err`: the outcome carries the report and
    /// no result. Only misuse (such as an out-of-range horizon) fails.
    pub fn run(&self, dataset: &RawDataset, horizon: usize) -> Result<ForecastOutcome> {
        self.check_horizon(horizon)?;

        let (series, report) = DataProcessor::new(&self.config).process(dataset);
        self.finish(series, report, horizon)
    }

    pub fn run_csv<P: AsRef<Path>>(&self, path: P, horizon: usize) -> Result<ForecastOutcome> {
        self.check_horizon(horizon)?;

        let (series, report) = DataProcessor::new(&self.config).process_csv(path);
        self.finish(series, report, horizon)
    }

    fn finish(
        &self,
        series: Option<ValidatedSeries>,
        report: ValidationReport,
        horizon: usize,
    ) -> Result<ForecastOutcome> {
        let series = match series {
            Some(series) if report.is_valid => series,
            _ => {
                info!("Validation failed with {} errors", report.errors.len());
                return Ok(ForecastOutcome {
                    report,
                    result: None,
                });
            }
        };

        let run = PipelineRun::train(&self.config, series);
        let result = run.forecast(horizon)?;

        info!(
            "Forecast {} months for {} columns",
            result.horizon(),
            result.selected_models.len()
        );

        Ok(ForecastOutcome {
            report,
            result: Some(result),
        })
    }
}

pub fn forecast_expenses(dataset: &RawDataset, horizon: usize) -> Result<ForecastOutcome> {
    ExpenseForecastPipeline::new(ForecastConfig::default())?.run(dataset, horizon)
}

pub fn forecast_expenses_with_config(
    dataset: &RawDataset,
    horizon: usize,
    config: &ForecastConfig,
) -> Result<ForecastOutcome> {
    ExpenseForecastPipeline::new(config.clone())?.run(dataset, horizon)
}

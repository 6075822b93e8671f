use crate::cleaning::DataCleaner;
use crate::config::ForecastConfig;
use crate::ingestion::load_csv;
use crate::quality::QualityAuditor;
use crate::error::ForecastError;
use crate::schema::{
    DataInfo, ExpenseColumn, RawDataset, TimePoint, ValidatedSeries, ValidationReport,
};
use crate::validation::SchemaValidator;
use log::{debug, info, warn};
use std::path::Path;

/// Runs schema validation, cleaning and the quality audit, producing the
/// report and, when it is valid, the sorted series.
pub struct DataProcessor<'a> {
    config: &'a ForecastConfig,
}

impl<'a> DataProcessor<'a> {
    pub fn new(config: &'a ForecastConfig) -> Self {
        Self { config }
    }

    pub fn process_csv<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> (Option<ValidatedSeries>, ValidationReport) {
        match load_csv(path) {
            Ok(dataset) => self.process(&dataset),
            Err(e) => {
                warn!("Could not read CSV: {}", e);
                let cause = match e {
                    ForecastError::IoError(inner) => inner.to_string(),
                    ForecastError::CsvError(inner) => inner.to_string(),
                    other => other.to_string(),
                };
                (
                    None,
                    ValidationReport::invalid(
                        vec![format!("Error reading CSV file: {}", cause)],
                        Vec::new(),
                    ),
                )
            }
        }
    }

    pub fn process(&self, dataset: &RawDataset) -> (Option<ValidatedSeries>, ValidationReport) {
        let structure_errors = SchemaValidator::new(self.config).validate(dataset);
        if !structure_errors.is_empty() {
            info!("Dataset rejected: {}", structure_errors.join("; "));
            return (None, ValidationReport::invalid(structure_errors, Vec::new()));
        }

        let cleaned = DataCleaner::new(self.config).clean(dataset);
        let mut warnings = cleaned.warnings.clone();
        if !cleaned.errors.is_empty() {
            info!("Dataset rejected during cleaning: {}", cleaned.errors.join("; "));
            return (None, ValidationReport::invalid(cleaned.errors, warnings));
        }

        let audit = QualityAuditor::new(self.config).audit(&cleaned.rows);
        warnings.extend(audit.warnings);
        if !audit.ok {
            info!("Dataset rejected by quality audit: {}", audit.errors.join("; "));
            return (None, ValidationReport::invalid(audit.errors, warnings));
        }

        let points: Vec<TimePoint> = cleaned
            .rows
            .iter()
            .filter_map(|row| {
                let month = row.month?;
                Some(TimePoint {
                    month,
                    category_values: ExpenseColumn::CATEGORIES
                        .iter()
                        .map(|c| (*c, row.value(*c)))
                        .collect(),
                    total: row.value(ExpenseColumn::Total),
                })
            })
            .collect();
        let series = ValidatedSeries::new(points);

        let date_range = match (series.first_month(), series.last_month()) {
            (Some(first), Some(last)) => format!(
                "{} to {}",
                first.format("%Y-%m-%d"),
                last.format("%Y-%m-%d")
            ),
            _ => String::new(),
        };

        let data_info = DataInfo {
            record_count: series.len(),
            date_range,
            missing_values_filled: cleaned.missing_values_filled,
        };

        debug!(
            "Accepted {} records ({}) with {} warnings",
            data_info.record_count,
            data_info.date_range,
            warnings.len()
        );

        (Some(series), ValidationReport::valid(warnings, data_info))
    }
}

use crate::config::ForecastConfig;
use crate::schema::{required_columns, RawDataset};

/// Structural checks run before any cell is interpreted.
pub struct SchemaValidator<'a> {
    config: &'a ForecastConfig,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(config: &'a ForecastConfig) -> Self {
        Self { config }
    }

    /// Returns the fatal errors found; an empty list means cleaning may proceed.
    pub fn validate(&self, dataset: &RawDataset) -> Vec<String> {
        let mut errors = Vec::new();

        if dataset.is_empty() {
            errors.push("CSV file is empty".to_string());
            return errors;
        }

        let missing = missing_columns(&dataset.columns);
        if !missing.is_empty() {
            errors.push(format!("Missing required columns: {}", missing.join(", ")));
        }

        if dataset.len() < self.config.min_history_months {
            errors.push(format!(
                "CSV must contain at least {} months of data for meaningful forecasting",
                self.config.min_history_months
            ));
        }

        errors
    }
}

/// Position of `name` among `columns`, comparing trimmed and case-insensitively.
pub fn find_column(columns: &[String], name: &str) -> Option<usize> {
    columns
        .iter()
        .position(|c| c.trim().eq_ignore_ascii_case(name))
}

pub fn missing_columns(columns: &[String]) -> Vec<&'static str> {
    required_columns()
        .into_iter()
        .filter(|required| find_column(columns, required).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [&str; 7] = [
        "Month",
        "Miscellaneous",
        "Financial",
        "CapEx",
        "COGS",
        "Operating",
        "Total",
    ];

    fn dataset(columns: &[&str], rows: usize) -> RawDataset {
        let row: Vec<&str> = columns.iter().map(|_| "1").collect();
        RawDataset::from_strings(columns, &vec![row; rows])
    }

    #[test]
    fn test_empty_dataset_stops_early() {
        let config = ForecastConfig::default();
        let errors = SchemaValidator::new(&config).validate(&dataset(&["Month"], 0));
        assert_eq!(errors, vec!["CSV file is empty".to_string()]);
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let config = ForecastConfig::default();
        let errors = SchemaValidator::new(&config)
            .validate(&dataset(&["Month", "Miscellaneous", "Total"], 12));
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0],
            "Missing required columns: Financial, CapEx, COGS, Operating"
        );
    }

    #[test]
    fn test_column_match_ignores_whitespace_and_case() {
        let columns = vec![" month ".to_string(), "TOTAL".to_string()];
        assert_eq!(find_column(&columns, "Month"), Some(0));
        assert_eq!(find_column(&columns, "Total"), Some(1));
        assert_eq!(find_column(&columns, "COGS"), None);
    }

    #[test]
    fn test_short_history_rejected() {
        let config = ForecastConfig::default();
        let errors = SchemaValidator::new(&config).validate(&dataset(&HEADER, 10));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at least 12 months"));
    }

    #[test]
    fn test_well_formed_passes() {
        let config = ForecastConfig::default();
        let errors = SchemaValidator::new(&config).validate(&dataset(&HEADER, 12));
        assert!(errors.is_empty());
    }
}

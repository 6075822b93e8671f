use crate::cleaning::CleanedRow;
use crate::config::ForecastConfig;
use crate::schema::ExpenseColumn;
use crate::utils::{add_months, median};
use chrono::NaiveDate;
use log::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityAudit {
    pub ok: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Statistical checks on cleaned rows. Only unresolved months are fatal.
pub struct QualityAuditor<'a> {
    config: &'a ForecastConfig,
}

impl<'a> QualityAuditor<'a> {
    pub fn new(config: &'a ForecastConfig) -> Self {
        Self { config }
    }

    pub fn audit(&self, rows: &[CleanedRow]) -> QualityAudit {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if rows.iter().any(|r| r.month.is_none()) {
            errors.push("Some dates could not be parsed. Please check date format.".to_string());
        }

        for column in ExpenseColumn::ALL {
            let negatives = rows.iter().filter(|r| r.value(column) < 0.0).count();
            if negatives > 0 {
                warnings.push(format!(
                    "Column '{}' contains {} negative values",
                    column, negatives
                ));
            }
        }

        for column in ExpenseColumn::ALL {
            let values: Vec<f64> = rows.iter().map(|r| r.value(column)).collect();
            if let Some(median) = median(&values) {
                if median > 0.0
                    && values
                        .iter()
                        .any(|v| *v > median * self.config.outlier_multiplier)
                {
                    warnings.push(format!("Column '{}' contains potential outliers", column));
                }
            }
        }

        let gaps = self.find_date_gaps(rows);
        if !gaps.is_empty() {
            debug!("Found {} date gaps", gaps.len());
            let shown: Vec<&str> = gaps.iter().take(3).map(String::as_str).collect();
            warnings.push(format!("Date gaps detected: {}", shown.join(", ")));
        }

        if rows.len() < self.config.recommended_history_months {
            warnings.push(format!(
                "Only {} months of data available. More data will improve forecast accuracy.",
                rows.len()
            ));
        }

        QualityAudit {
            ok: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Labels `"YYYY-MM to YYYY-MM"` for consecutive months that are not one
    /// calendar month apart, within the configured tolerance.
    pub fn find_date_gaps(&self, rows: &[CleanedRow]) -> Vec<String> {
        let mut months: Vec<NaiveDate> = rows.iter().filter_map(|r| r.month).collect();
        months.sort();

        months
            .windows(2)
            .filter(|pair| match add_months(pair[0], 1) {
                Ok(expected) => {
                    (pair[1] - expected).num_days().abs() > self.config.gap_tolerance_days
                }
                Err(_) => true,
            })
            .map(|pair| {
                format!(
                    "{} to {}",
                    pair[0].format("%Y-%m"),
                    pair[1].format("%Y-%m")
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(month: Option<NaiveDate>, value: f64) -> CleanedRow {
        let mut values: BTreeMap<ExpenseColumn, f64> = ExpenseColumn::CATEGORIES
            .iter()
            .map(|c| (*c, value))
            .collect();
        values.insert(ExpenseColumn::Total, value * 5.0);
        CleanedRow { month, values }
    }

    fn monthly_rows(count: u32, value: f64) -> Vec<CleanedRow> {
        (0..count)
            .map(|i| {
                let month = add_months(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(), i).unwrap();
                row(Some(month), value)
            })
            .collect()
    }

    #[test]
    fn test_clean_history_has_no_findings() {
        let config = ForecastConfig::default();
        let audit = QualityAuditor::new(&config).audit(&monthly_rows(24, 100.0));
        assert!(audit.ok);
        assert!(audit.errors.is_empty());
        assert!(audit.warnings.is_empty());
    }

    #[test]
    fn test_null_month_is_fatal() {
        let config = ForecastConfig::default();
        let mut rows = monthly_rows(24, 100.0);
        rows[3].month = None;
        let audit = QualityAuditor::new(&config).audit(&rows);
        assert!(!audit.ok);
        assert_eq!(
            audit.errors,
            vec!["Some dates could not be parsed. Please check date format.".to_string()]
        );
    }

    #[test]
    fn test_negative_and_outlier_warnings() {
        let config = ForecastConfig::default();
        let mut rows = monthly_rows(24, 100.0);
        rows[0].values.insert(ExpenseColumn::Financial, -5.0);
        rows[1].values.insert(ExpenseColumn::Financial, -6.0);
        rows[2].values.insert(ExpenseColumn::CapEx, 5_000.0);

        let audit = QualityAuditor::new(&config).audit(&rows);
        assert!(audit.ok);
        assert!(audit
            .warnings
            .contains(&"Column 'Financial' contains 2 negative values".to_string()));
        assert!(audit
            .warnings
            .contains(&"Column 'CapEx' contains potential outliers".to_string()));
    }

    #[test]
    fn test_two_month_gap_is_reported() {
        let config = ForecastConfig::default();
        let mut rows = monthly_rows(25, 100.0);
        rows.remove(4);

        let audit = QualityAuditor::new(&config).audit(&rows);
        assert!(audit.ok);
        assert_eq!(
            audit.warnings,
            vec!["Date gaps detected: 2022-04 to 2022-06".to_string()]
        );
    }

    #[test]
    fn test_month_end_dates_are_not_gaps() {
        let config = ForecastConfig::default();
        let dates = [(2023, 1, 31), (2023, 2, 28), (2023, 3, 31), (2023, 4, 30)];
        let rows: Vec<CleanedRow> = dates
            .iter()
            .map(|(y, m, d)| row(NaiveDate::from_ymd_opt(*y, *m, *d), 1.0))
            .collect();

        assert!(QualityAuditor::new(&config).find_date_gaps(&rows).is_empty());
    }

    #[test]
    fn test_gap_list_is_capped_at_three() {
        let config = ForecastConfig::default();
        let rows: Vec<CleanedRow> = (0..6)
            .map(|i| {
                let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
                let month = add_months(start, i * 2).unwrap();
                row(Some(month), 1.0)
            })
            .collect();

        let audit = QualityAuditor::new(&config).audit(&rows);
        let gap_warning = audit
            .warnings
            .iter()
            .find(|w| w.starts_with("Date gaps detected"))
            .unwrap();
        assert_eq!(gap_warning.matches(" to ").count(), 3);
    }

    #[test]
    fn test_short_history_warning() {
        let config = ForecastConfig::default();
        let audit = QualityAuditor::new(&config).audit(&monthly_rows(12, 100.0));
        assert_eq!(
            audit.warnings,
            vec!["Only 12 months of data available. More data will improve forecast accuracy."
                .to_string()]
        );
    }
}

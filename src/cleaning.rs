use crate::balancer::{reconcile_totals, TotalBalancer};
use crate::config::ForecastConfig;
use crate::schema::{ExpenseColumn, RawDataset, MONTH_COLUMN};
use crate::utils::{parse_amount, parse_month};
use crate::validation::find_column;
use chrono::NaiveDate;
use log::{debug, warn};
use splines::{Interpolation, Key, Spline};
use std::collections::BTreeMap;

/// A row after parsing. `month` stays `None` when no date pattern matched.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRow {
    pub month: Option<NaiveDate>,
    pub values: BTreeMap<ExpenseColumn, f64>,
}

impl CleanedRow {
    pub fn value(&self, column: ExpenseColumn) -> f64 {
        self.values.get(&column).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CleanedData {
    pub rows: Vec<CleanedRow>,
    pub missing_values_filled: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

pub struct DataCleaner<'a> {
    config: &'a ForecastConfig,
}

impl<'a> DataCleaner<'a> {
    pub fn new(config: &'a ForecastConfig) -> Self {
        Self { config }
    }

    /// Expects a dataset that already passed [`crate::validation::SchemaValidator`].
    pub fn clean(&self, dataset: &RawDataset) -> CleanedData {
        let mut result = CleanedData::default();
        let columns: Vec<String> = dataset.columns.iter().map(|c| c.trim().to_string()).collect();

        let months: Vec<Option<NaiveDate>> = match find_column(&columns, MONTH_COLUMN) {
            Some(idx) => (0..dataset.len())
                .map(|row| dataset.cell(row, idx).and_then(parse_month))
                .collect(),
            None => vec![None; dataset.len()],
        };

        let mut filled_columns: BTreeMap<ExpenseColumn, Vec<f64>> = BTreeMap::new();
        let mut total_missing = false;

        for column in ExpenseColumn::ALL {
            let parsed: Vec<Option<f64>> = match find_column(&columns, column.name()) {
                Some(idx) => (0..dataset.len())
                    .map(|row| dataset.cell(row, idx).and_then(parse_amount))
                    .collect(),
                None => vec![None; dataset.len()],
            };

            match interpolate_missing(&parsed) {
                Some((values, filled)) => {
                    if filled > 0 {
                        debug!("Interpolated {} missing values in {}", filled, column);
                    }
                    result.missing_values_filled += filled;
                    filled_columns.insert(column, values);
                }
                None if column == ExpenseColumn::Total => {
                    total_missing = true;
                }
                None => {
                    result
                        .errors
                        .push(format!("Column '{}' contains no numeric values", column));
                }
            }
        }

        if !result.errors.is_empty() {
            return result;
        }

        result.rows = months
            .into_iter()
            .enumerate()
            .map(|(i, month)| CleanedRow {
                month,
                values: filled_columns
                    .iter()
                    .map(|(column, values)| (*column, values[i]))
                    .collect(),
            })
            .collect();

        let recalculated = if total_missing {
            TotalBalancer::new(
                self.config.total_relative_tolerance,
                self.config.total_absolute_tolerance,
            )
            .enforce(&mut result.rows);
            true
        } else {
            reconcile_totals(
                &mut result.rows,
                self.config.total_relative_tolerance,
                self.config.total_absolute_tolerance,
            )
        };
        if recalculated {
            warn!("Total column disagrees with category sums; recalculating");
            result
                .warnings
                .push("Total column recalculated from category sums".to_string());
        }

        result
    }
}

/// Fills gaps by linear interpolation over row position. Gaps before the
/// first or after the last known value take the nearest known value.
/// Returns `None` when the column has no known value at all.
pub fn interpolate_missing(values: &[Option<f64>]) -> Option<(Vec<f64>, usize)> {
    let keys: Vec<Key<f64, f64>> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| Key::new(i as f64, v, Interpolation::Linear)))
        .collect();

    if keys.is_empty() {
        return None;
    }

    let spline = Spline::from_vec(keys);
    let mut filled = 0;

    let mut out = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => out.push(*v),
            None => {
                out.push(spline.clamped_sample(i as f64)?);
                filled += 1;
            }
        }
    }

    Some((out, filled))
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

    #[test]
    fn test_interpolation_fills_mean_between_neighbours() {
        let (values, filled) =
            interpolate_missing(&[Some(100.0), None, Some(300.0)]).unwrap();
        assert_eq!(filled, 1);
        assert!((values[1] - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_is_linear_in_position() {
        let (values, filled) =
            interpolate_missing(&[Some(0.0), None, None, Some(30.0)]).unwrap();
        assert_eq!(filled, 2);
        assert!((values[1] - 10.0).abs() < 1e-9);
        assert!((values[2] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_edges_take_nearest() {
        let (values, filled) =
            interpolate_missing(&[None, Some(5.0), Some(7.0), None]).unwrap();
        assert_eq!(filled, 2);
        assert_eq!(values, vec![5.0, 5.0, 7.0, 7.0]);
        assert!(interpolate_missing(&[None, None]).is_none());
    }

    #[test]
    fn test_clean_parses_formats_and_trims_headers() {
        let config = ForecastConfig::default();
        let raw = RawDataset::from_strings(
            &[" Month ", "Miscellaneous", "Financial ", "CapEx", "COGS", "Operating", "Total"],
            &[
                vec!["Jan 2023", "$1,000", "(200)", "300", "400", "500", "2000"],
                vec!["2023-02-01", "1,100", "", "300", "400", "500", "2100"],
                vec!["03/01/2023", "1200", "-100", "300", "400", "500", "2300"],
                vec!["garbage", "1300", "-100", "300", "400", "500", "2400"],
            ],
        );

        let cleaned = DataCleaner::new(&config).clean(&raw);
        assert!(cleaned.errors.is_empty());
        assert_eq!(cleaned.missing_values_filled, 1);
        assert_eq!(cleaned.rows[0].month, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(cleaned.rows[2].month, NaiveDate::from_ymd_opt(2023, 3, 1));
        assert_eq!(cleaned.rows[3].month, None);
        assert_eq!(cleaned.rows[0].value(ExpenseColumn::Miscellaneous), 1000.0);
        assert_eq!(cleaned.rows[0].value(ExpenseColumn::Financial), -200.0);
        assert!((cleaned.rows[1].value(ExpenseColumn::Financial) + 150.0).abs() < 1e-9);
        assert!(cleaned.warnings.is_empty());
    }

    #[test]
    fn test_total_recalculated_when_off() {
        let config = ForecastConfig::default();
        let raw = RawDataset::from_strings(
            &HEADER,
            &[
                vec!["2023-01", "100", "100", "100", "100", "100", "500"],
                vec!["2023-02", "100", "100", "100", "100", "100", "900"],
            ],
        );

        let cleaned = DataCleaner::new(&config).clean(&raw);
        assert_eq!(
            cleaned.warnings,
            vec!["Total column recalculated from category sums".to_string()]
        );
        assert_eq!(cleaned.rows[1].value(ExpenseColumn::Total), 500.0);
    }

    #[test]
    fn test_total_kept_within_tolerance() {
        let config = ForecastConfig::default();
        let raw = RawDataset::from_strings(
            &HEADER,
            &[
                vec!["2023-01", "100", "100", "100", "100", "100", "550"],
                vec!["2023-02", "100", "100", "100", "100", "100", "460"],
            ],
        );

        let cleaned = DataCleaner::new(&config).clean(&raw);
        assert!(cleaned.warnings.is_empty());
        assert_eq!(cleaned.rows[0].value(ExpenseColumn::Total), 550.0);
        assert_eq!(cleaned.rows[1].value(ExpenseColumn::Total), 460.0);
    }

    #[test]
    fn test_blank_total_column_is_derived() {
        let config = ForecastConfig::default();
        let raw = RawDataset::from_strings(
            &HEADER,
            &[
                vec!["2023-01", "1", "2", "3", "4", "5", ""],
                vec!["2023-02", "1", "2", "3", "4", "6", ""],
            ],
        );

        let cleaned = DataCleaner::new(&config).clean(&raw);
        assert!(cleaned.errors.is_empty());
        assert_eq!(cleaned.rows[1].value(ExpenseColumn::Total), 16.0);
        assert_eq!(cleaned.warnings.len(), 1);
    }

    #[test]
    fn test_unparsable_category_is_fatal() {
        let config = ForecastConfig::default();
        let raw = RawDataset::from_strings(
            &HEADER,
            &[
                vec!["2023-01", "x", "2", "3", "4", "5", "15"],
                vec!["2023-02", "y", "2", "3", "4", "5", "15"],
            ],
        );

        let cleaned = DataCleaner::new(&config).clean(&raw);
        assert_eq!(
            cleaned.errors,
            vec!["Column 'Miscellaneous' contains no numeric values".to_string()]
        );
    }
}

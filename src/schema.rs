use crate::error::Result;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const MONTH_COLUMN: &str = "Month";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum ExpenseColumn {
    #[schemars(description = "Miscellaneous expenses that fit no other bucket")]
    Miscellaneous,

    #[schemars(description = "Financial expenses such as interest and bank fees")]
    Financial,

    #[schemars(description = "Capital expenditure")]
    CapEx,

    #[serde(rename = "COGS")]
    #[schemars(description = "Cost of goods sold")]
    Cogs,

    #[schemars(description = "Operating expenses such as salaries, rent and utilities")]
    Operating,

    #[schemars(
        description = "Aggregate of the five categories. Always derived as their sum, never forecast on its own"
    )]
    Total,
}

impl ExpenseColumn {
    /// The five independently forecast categories, in declared order.
    pub const CATEGORIES: [ExpenseColumn; 5] = [
        ExpenseColumn::Miscellaneous,
        ExpenseColumn::Financial,
        ExpenseColumn::CapEx,
        ExpenseColumn::Cogs,
        ExpenseColumn::Operating,
    ];

    /// Categories followed by `Total`. This is also the training order.
    pub const ALL: [ExpenseColumn; 6] = [
        ExpenseColumn::Miscellaneous,
        ExpenseColumn::Financial,
        ExpenseColumn::CapEx,
        ExpenseColumn::Cogs,
        ExpenseColumn::Operating,
        ExpenseColumn::Total,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExpenseColumn::Miscellaneous => "Miscellaneous",
            ExpenseColumn::Financial => "Financial",
            ExpenseColumn::CapEx => "CapEx",
            ExpenseColumn::Cogs => "COGS",
            ExpenseColumn::Operating => "Operating",
            ExpenseColumn::Total => "Total",
        }
    }
}

impl fmt::Display for ExpenseColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column names a dataset must carry, `Month` first.
pub fn required_columns() -> Vec<&'static str> {
    std::iter::once(MONTH_COLUMN)
        .chain(ExpenseColumn::ALL.iter().map(|c| c.name()))
        .collect()
}

/// An uploaded table before any interpretation. `None` marks a blank or NA cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawDataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Builds a dataset from string literals; empty cells become `None`.
    pub fn from_strings(columns: &[&str], rows: &[Vec<&str>]) -> Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        if cell.trim().is_empty() {
                            None
                        } else {
                            Some(cell.to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimePoint {
    #[schemars(description = "Calendar month of the observation (YYYY-MM-DD as parsed)")]
    pub month: NaiveDate,

    #[schemars(description = "Amount per expense category")]
    pub category_values: BTreeMap<ExpenseColumn, f64>,

    #[schemars(description = "Aggregate amount, equal to the category sum within tolerance")]
    pub total: f64,
}

impl TimePoint {
    pub fn value(&self, column: ExpenseColumn) -> f64 {
        match column {
            ExpenseColumn::Total => self.total,
            category => self.category_values.get(&category).copied().unwrap_or(0.0),
        }
    }

    pub fn category_sum(&self) -> f64 {
        ExpenseColumn::CATEGORIES
            .iter()
            .map(|c| self.value(*c))
            .sum()
    }
}

/// Cleaned history sorted ascending by month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidatedSeries {
    pub points: Vec<TimePoint>,
}

impl ValidatedSeries {
    pub fn new(mut points: Vec<TimePoint>) -> Self {
        points.sort_by_key(|p| p.month);
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn months(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.month).collect()
    }

    pub fn values(&self, column: ExpenseColumn) -> Vec<f64> {
        self.points.iter().map(|p| p.value(column)).collect()
    }

    pub fn first_month(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.month)
    }

    pub fn last_month(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.month)
    }

    pub fn to_csv(&self) -> String {
        render_csv(
            self.points
                .iter()
                .map(|p| (p.month, &p.category_values, p.total)),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataInfo {
    #[schemars(description = "Number of monthly records after cleaning")]
    pub record_count: usize,

    #[schemars(description = "First and last month, formatted as 'YYYY-MM-DD to YYYY-MM-DD'")]
    pub date_range: String,

    #[schemars(description = "Number of numeric cells filled by linear interpolation")]
    pub missing_values_filled: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    pub is_valid: bool,

    #[schemars(description = "Fatal problems, in the order they were found")]
    pub errors: Vec<String>,

    #[schemars(description = "Non-fatal data quality findings")]
    pub warnings: Vec<String>,

    #[schemars(description = "Summary of the accepted data. Absent when the input is invalid")]
    pub data_info: Option<DataInfo>,
}

impl ValidationReport {
    pub fn invalid(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
            warnings,
            data_info: None,
        }
    }

    pub fn valid(warnings: Vec<String>, data_info: DataInfo) -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings,
            data_info: Some(data_info),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelMetrics {
    #[serde(rename = "MAE")]
    pub mae: f64,

    #[serde(rename = "RMSE")]
    pub rmse: f64,

    #[serde(rename = "R²")]
    pub r2: f64,
}

impl ModelMetrics {
    /// MAE and RMSE to cents, R² to four places, as presented to users.
    pub fn rounded(&self) -> Self {
        Self {
            mae: round_to(self.mae, 2),
            rmse: round_to(self.rmse, 2),
            r2: round_to(self.r2, 4),
        }
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastPoint {
    #[schemars(description = "Future calendar month")]
    pub month: NaiveDate,

    #[schemars(description = "Forecast amount per expense category")]
    pub category_values: BTreeMap<ExpenseColumn, f64>,

    #[schemars(description = "Sum of the five category forecasts")]
    pub total: f64,
}

impl ForecastPoint {
    pub fn value(&self, column: ExpenseColumn) -> f64 {
        match column {
            ExpenseColumn::Total => self.total,
            category => self.category_values.get(&category).copied().unwrap_or(0.0),
        }
    }
}

pub type PerformanceTable = BTreeMap<ExpenseColumn, BTreeMap<String, ModelMetrics>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastResult {
    #[schemars(description = "One point per forecast month; length equals the horizon")]
    pub points: Vec<ForecastPoint>,

    #[schemars(description = "Test-set metrics per column and candidate model name")]
    pub performance: PerformanceTable,

    #[schemars(description = "Name of the candidate selected for each trained column")]
    pub selected_models: BTreeMap<ExpenseColumn, String>,

    #[serde(default)]
    #[schemars(
        description = "Columns whose training failed, with the reason. Their categories were projected by compound growth instead"
    )]
    pub category_failures: BTreeMap<ExpenseColumn, String>,
}

impl ForecastResult {
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    pub fn series(&self, column: ExpenseColumn) -> Vec<f64> {
        self.points.iter().map(|p| p.value(column)).collect()
    }

    pub fn to_csv(&self) -> String {
        render_csv(
            self.points
                .iter()
                .map(|p| (p.month, &p.category_values, p.total)),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastOutcome {
    pub report: ValidationReport,

    #[schemars(description = "Present only when the report is valid")]
    pub result: Option<ForecastResult>,
}

impl ForecastOutcome {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ForecastOutcome)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn render_csv<'a>(
    rows: impl Iterator<Item = (NaiveDate, &'a BTreeMap<ExpenseColumn, f64>, f64)>,
) -> String {
    let mut out = required_columns().join(",");
    out.push('\n');

    for (month, values, total) in rows {
        out.push_str(&month.format("%Y-%m-%d").to_string());
        for category in ExpenseColumn::CATEGORIES {
            let value = values.get(&category).copied().unwrap_or(0.0);
            out.push_str(&format!(",{:.2}", value));
        }
        out.push_str(&format!(",{:.2}\n", total));
    }

    out
}

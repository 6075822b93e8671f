use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime};

/// One attempt in the month parser chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePattern {
    /// A full calendar date, e.g. `%Y-%m-%d`.
    Date(&'static str),
    /// A date with a time of day; the time is dropped.
    DateTime(&'static str),
    /// A pattern without a day; resolves to the 1st of the month.
    YearMonth(&'static str),
    Rfc3339,
    Rfc2822,
}

/// Four-digit years only. `%Y` accepts signed and short years, so `Jan-2023`
/// would otherwise read as year -2023 through `%b %Y`.
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1000..=9999;

impl DatePattern {
    pub fn parse(&self, input: &str) -> Option<NaiveDate> {
        self.parse_unchecked(input)
            .filter(|date| PLAUSIBLE_YEARS.contains(&date.year()))
    }

    fn parse_unchecked(&self, input: &str) -> Option<NaiveDate> {
        match self {
            DatePattern::Date(fmt) => NaiveDate::parse_from_str(input, fmt).ok(),
            DatePattern::DateTime(fmt) => NaiveDateTime::parse_from_str(input, fmt)
                .ok()
                .map(|dt| dt.date()),
            DatePattern::YearMonth(fmt) => {
                NaiveDate::parse_from_str(&format!("01 {}", input), &format!("%d {}", fmt)).ok()
            }
            DatePattern::Rfc3339 => DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.date_naive()),
            DatePattern::Rfc2822 => DateTime::parse_from_rfc2822(input)
                .ok()
                .map(|dt| dt.date_naive()),
        }
    }
}

/// Accepted month formats, tried in this order. The first success wins.
pub const EXPLICIT_MONTH_PATTERNS: [DatePattern; 8] = [
    DatePattern::Date("%Y-%m-%d"),
    DatePattern::DateTime("%Y-%m-%d %H:%M:%S"),
    DatePattern::Date("%m/%d/%Y"),
    DatePattern::Date("%d/%m/%Y"),
    DatePattern::YearMonth("%Y-%m"),
    DatePattern::YearMonth("%m/%Y"),
    DatePattern::YearMonth("%B %Y"),
    DatePattern::YearMonth("%b %Y"),
];

/// Catch-all formats tried only after every explicit pattern failed.
pub const LENIENT_MONTH_PATTERNS: [DatePattern; 22] = [
    DatePattern::Rfc3339,
    DatePattern::Rfc2822,
    DatePattern::DateTime("%Y-%m-%dT%H:%M:%S"),
    DatePattern::DateTime("%Y-%m-%dT%H:%M:%S%.f"),
    DatePattern::DateTime("%Y-%m-%d %H:%M:%S%.f"),
    DatePattern::DateTime("%Y-%m-%d %H:%M"),
    DatePattern::DateTime("%m/%d/%Y %H:%M:%S"),
    DatePattern::DateTime("%m/%d/%Y %H:%M"),
    DatePattern::Date("%Y/%m/%d"),
    DatePattern::Date("%Y.%m.%d"),
    DatePattern::Date("%d.%m.%Y"),
    DatePattern::Date("%m-%d-%Y"),
    DatePattern::Date("%d-%m-%Y"),
    DatePattern::Date("%B %d, %Y"),
    DatePattern::Date("%b %d, %Y"),
    DatePattern::Date("%d %B %Y"),
    DatePattern::Date("%d %b %Y"),
    DatePattern::Date("%Y%m%d"),
    DatePattern::YearMonth("%Y/%m"),
    DatePattern::YearMonth("%B-%Y"),
    DatePattern::YearMonth("%b-%Y"),
    DatePattern::YearMonth("%b-%y"),
];

/// Parses a month cell. Returns `None` when no pattern matches.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let input = raw.trim();
    if input.is_empty() {
        return None;
    }

    EXPLICIT_MONTH_PATTERNS
        .iter()
        .chain(LENIENT_MONTH_PATTERNS.iter())
        .find_map(|pattern| pattern.parse(input))
}

const CURRENCY_SYMBOLS: [char; 5] = ['$', '€', '£', '¥', '₹'];

/// Parses a currency-formatted amount such as `"$1,234.56"` or `"(500)"`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.len() >= 2 && cleaned.starts_with('(') && cleaned.ends_with(')') {
        cleaned = format!("-{}", &cleaned[1..cleaned.len() - 1]);
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        ForecastError::DateError(format!("Cannot advance {} by {} months", date, months))
    })
}

/// Rolls `(year, month_of_year)` forward by `steps` months.
pub fn advance_year_month(year: i32, month_of_year: u32, steps: u32) -> (i32, u32) {
    let zero_based = month_of_year - 1 + steps;
    (year + (zero_based / 12) as i32, zero_based % 12 + 1)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Slope of the degree-1 least-squares line through `(i, values[i])`.
pub fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let (mut covariance, mut variance) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        covariance += dx * (y - y_mean);
        variance += dx * dx;
    }

    covariance / variance
}

use crate::cleaning::CleanedRow;
use crate::error::{ForecastError, Result};
use crate::schema::{ExpenseColumn, ForecastPoint, TimePoint};
use log::debug;

/// A record carrying five category amounts and an aggregate `Total`.
pub trait CategoryTotals {
    fn category_sum(&self) -> f64;
    fn total(&self) -> f64;
    fn set_total(&mut self, total: f64);
    fn label(&self) -> String;
}

impl CategoryTotals for CleanedRow {
    fn category_sum(&self) -> f64 {
        ExpenseColumn::CATEGORIES.iter().map(|c| self.value(*c)).sum()
    }

    fn total(&self) -> f64 {
        self.value(ExpenseColumn::Total)
    }

    fn set_total(&mut self, total: f64) {
        self.values.insert(ExpenseColumn::Total, total);
    }

    fn label(&self) -> String {
        self.month
            .map(|m| m.format("%Y-%m").to_string())
            .unwrap_or_else(|| "unknown month".to_string())
    }
}

impl CategoryTotals for TimePoint {
    fn category_sum(&self) -> f64 {
        ExpenseColumn::CATEGORIES.iter().map(|c| self.value(*c)).sum()
    }

    fn total(&self) -> f64 {
        self.total
    }

    fn set_total(&mut self, total: f64) {
        self.total = total;
    }

    fn label(&self) -> String {
        self.month.format("%Y-%m").to_string()
    }
}

impl CategoryTotals for ForecastPoint {
    fn category_sum(&self) -> f64 {
        ExpenseColumn::CATEGORIES.iter().map(|c| self.value(*c)).sum()
    }

    fn total(&self) -> f64 {
        self.total
    }

    fn set_total(&mut self, total: f64) {
        self.total = total;
    }

    fn label(&self) -> String {
        self.month.format("%Y-%m").to_string()
    }
}

pub struct TotalBalancer {
    relative_tolerance: f64,
    absolute_tolerance: f64,
}

impl TotalBalancer {
    pub fn new(relative_tolerance: f64, absolute_tolerance: f64) -> Self {
        Self {
            relative_tolerance,
            absolute_tolerance,
        }
    }

    /// Allowed |Total - sum| for a row whose categories add up to `category_sum`.
    pub fn tolerance_for(&self, category_sum: f64) -> f64 {
        (self.relative_tolerance * category_sum.abs()).max(self.absolute_tolerance)
    }

    pub fn needs_recalculation<T: CategoryTotals>(&self, records: &[T]) -> bool {
        records.iter().any(|record| {
            let sum = record.category_sum();
            (record.total() - sum).abs() > self.tolerance_for(sum)
        })
    }

    /// Replaces every Total with its category sum.
    pub fn enforce<T: CategoryTotals>(&self, records: &mut [T]) {
        for record in records.iter_mut() {
            let sum = record.category_sum();
            record.set_total(sum);
        }
    }

    pub fn verify<T: CategoryTotals>(&self, records: &[T]) -> Result<()> {
        for record in records {
            let sum = record.category_sum();
            if (record.total() - sum).abs() > self.tolerance_for(sum) {
                return Err(ForecastError::TotalMismatch {
                    month: record.label(),
                    total: record.total(),
                    category_sum: sum,
                });
            }
        }

        Ok(())
    }
}

/// Recomputes the whole Total column when any row misses the tolerance.
/// Returns whether the column was replaced.
pub fn reconcile_totals<T: CategoryTotals>(
    records: &mut [T],
    relative_tolerance: f64,
    absolute_tolerance: f64,
) -> bool {
    let balancer = TotalBalancer::new(relative_tolerance, absolute_tolerance);
    if !balancer.needs_recalculation(records) {
        return false;
    }

    debug!("Recomputing Total for {} records", records.len());
    balancer.enforce(records);
    true
}

pub fn verify_totals<T: CategoryTotals>(records: &[T], tolerance: f64) -> Result<()> {
    TotalBalancer::new(0.0, tolerance).verify(records)
}

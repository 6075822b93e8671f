use crate::schema::ValidatedSeries;
use crate::utils::advance_year_month;
use chrono::Datelike;

/// Positional and calendar features of one month. Category amounts never
/// enter the feature space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalFeatures {
    pub index: usize,
    pub year: i32,
    pub month_of_year: u32,
}

impl TemporalFeatures {
    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.index as f64, self.year as f64, self.month_of_year as f64]
    }

    /// The features `steps` months later; the year rolls over after December.
    pub fn advance(&self, steps: u32) -> Self {
        let (year, month_of_year) = advance_year_month(self.year, self.month_of_year, steps);
        Self {
            index: self.index + steps as usize,
            year,
            month_of_year,
        }
    }
}

pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn build(series: &ValidatedSeries) -> Vec<TemporalFeatures> {
        series
            .points
            .iter()
            .enumerate()
            .map(|(index, point)| TemporalFeatures {
                index,
                year: point.month.year(),
                month_of_year: point.month.month(),
            })
            .collect()
    }

    pub fn matrix(features: &[TemporalFeatures]) -> Vec<Vec<f64>> {
        features.iter().map(TemporalFeatures::to_vec).collect()
    }
}

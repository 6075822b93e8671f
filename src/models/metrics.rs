use crate::error::{ForecastError, Result};
use crate::schema::ModelMetrics;

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len().max(1),
            actual: predicted.len(),
        });
    }
    Ok(())
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let n = actual.len() as f64;
    Ok(actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n)
}

pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let n = actual.len() as f64;
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n;
    Ok(mse.sqrt())
}

/// Coefficient of determination. A constant `actual` scores 1.0 when matched
/// exactly and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let n = actual.len() as f64;
    let mean = actual.iter().sum::<f64>() / n;

    let ss_res: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}

pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<ModelMetrics> {
    Ok(ModelMetrics {
        mae: mean_absolute_error(actual, predicted)?,
        rmse: root_mean_squared_error(actual, predicted)?,
        r2: r2_score(actual, predicted)?,
    })
}

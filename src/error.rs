use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Invalid forecast horizon {horizon}: must be between 1 and {max}")]
    InvalidHorizon { horizon: usize, max: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Training failed for {category}: {details}")]
    TrainingError { category: String, details: String },

    #[error("Forecast failed for {category}: {details}")]
    ForecastFailed { category: String, details: String },

    #[error("Model has not been fitted: {0}")]
    NotFitted(String),

    #[error("Dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Total mismatch on {month}: Total ({total}) != sum of categories ({category_sum})")]
    TotalMismatch {
        month: String,
        total: f64,
        category_sum: f64,
    },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;

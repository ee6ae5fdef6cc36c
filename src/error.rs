use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("not enough history: {distinct_days} distinct days found, at least 8 are required")]
    EmptyHistory { distinct_days: usize },

    #[error("invalid timestamp on row {row}: {value:?}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("unsupported forecast horizon {0} (expected 1 or 7)")]
    InvalidHorizon(u32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;

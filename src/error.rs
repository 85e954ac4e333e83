//! Error types for loading, aggregating and animating solar cells

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolarHexError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Instance capacity exceeded: all {capacity} slots are allocated")]
    CapacityExceeded { capacity: usize },

    #[error("Failed to load {}: {reason}", path.display())]
    DataFetch { path: PathBuf, reason: String },

    #[error("Malformed input row {line}: {reason}")]
    MalformedInputRow { line: u64, reason: String },

    #[error("Invalid geometry: {0}")]
    Geometry(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SolarHexError {
    pub fn data_fetch(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SolarHexError::DataFetch {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SolarHexError>;

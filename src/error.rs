//! Error types for actiwin

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during segmentation, windowing, shuffling or ingestion
#[derive(Debug, Error)]
pub enum ComputeError {
    /// Upstream broke the observation contract (null timestamp, mixed subjects, ...)
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Invalid observation count {count} for day {day}")]
    InvalidCount { day: NaiveDate, count: i64 },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid window policy: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unexpected subject file name: {0}")]
    UnexpectedFileName(String),

    #[error("Missing directory: {0}")]
    MissingDirectory(String),

    #[error("No subject files found under {0}")]
    NoSubjectFiles(String),
}

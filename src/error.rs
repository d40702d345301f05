//! Error types for brandpulse

use thiserror::Error;

/// Errors that can surface while loading inputs or encoding results.
///
/// The correlation core itself never fails: per-brand problems become
/// [`crate::types::SkipReason`] values instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Stock source error: {0}")]
    StockSource(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

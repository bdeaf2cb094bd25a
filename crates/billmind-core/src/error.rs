use std::io;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Bill not found: {0}")]
    BillNotFound(Uuid),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
}

/// Reasons a notification text could not be turned into a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no known pattern matched the text")]
    NoPatternMatched,
    #[error("malformed amount `{0}`")]
    MalformedAmount(String),
    #[error("malformed date `{0}`")]
    MalformedDate(String),
}

/// Failures reported by an overdue-risk model. The predictor never surfaces these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskModelError {
    #[error("risk model unavailable")]
    Unavailable,
    #[error("risk model failed: {0}")]
    Failed(String),
}

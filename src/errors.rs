use thiserror::Error;

use billmind_config::ConfigError;
use billmind_core::CoreError;

/// Failures surfaced by the command-line frontend.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("No bill matches `{0}`")]
    UnknownBill(String),
    #[error("`{prefix}` matches {count} bills; use a longer id")]
    AmbiguousBill { prefix: String, count: usize },
}

pub type CliResult<T> = Result<T, CliError>;

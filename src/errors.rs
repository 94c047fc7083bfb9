use thiserror::Error;

/// Error type that captures sampling, persistence and configuration failures.
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No eligible amount to sample")]
    NoEligibleAmount,
}

pub type Result<T> = std::result::Result<T, SamplingError>;

/// User-facing CLI error wrapper.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] SamplingError),
    #[error("Command failed: {0}")]
    Command(String),
}

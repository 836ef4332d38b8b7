//! Error types for mdon

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MdError>;

#[derive(Error, Debug)]
pub enum MdError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Instance error: {0}")]
    Instance(#[from] InstanceError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl MdError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            MdError::InvalidInput(_) => 3,
            MdError::Instance(InstanceError::Authentication(_)) => 2,
            MdError::Instance(_) => 1,
            MdError::Config(_) => 1,
            MdError::Output(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No config file found (looked in: {0})")]
    NotFound(String),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug, Clone)]
pub enum InstanceError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Stream closed: {0}")]
    Stream(String),
}

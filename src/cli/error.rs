//! CLI error types and conversions

use crate::error::{ClientError, ErrorKind};

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// API call failed
    #[error("{0}")]
    Client(#[from] ClientError),

    /// Writing output failed
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing JSON output failed
    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

impl CliError {
    /// Error kind when the failure came from the API
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CliError::Client(err) => err.kind(),
            _ => None,
        }
    }

    /// Recovery suggestions to print after the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            CliError::Client(err) => err.suggestions(),
            CliError::ConfigurationError(_) => vec![
                "Pass --base-url and --api-key, or set SLUGKIT_BASE_URL and SLUGKIT_API_KEY",
            ],
            _ => Vec::new(),
        }
    }
}

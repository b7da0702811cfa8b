use localizer::ReconstructError;
use thiserror::Error;

/// Error types for the translation layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MtError {
    /// Missing or invalid configuration, including rejected credentials
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure talking to a provider
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered but produced no usable translation
    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    /// The request queue dropped the task before running it
    #[error("Request queue closed before the task ran")]
    QueueClosed,

    /// A JSON document could not be decoded or re-encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Reconstruction error: {0}")]
    Reconstruction(#[from] ReconstructError),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        MtError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for MtError {
    fn from(err: serde_json::Error) -> Self {
        MtError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for MtError {
    fn from(err: std::io::Error) -> Self {
        MtError::Io(err.to_string())
    }
}

/// Result type for translation operations
pub type MtResult<T> = Result<T, MtError>;

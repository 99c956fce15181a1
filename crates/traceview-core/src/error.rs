//! Error types for TraceView

use thiserror::Error;

/// Result type alias using TraceView's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for TraceView operations
#[derive(Error, Debug)]
pub enum Error {
    /// The trace collection could not be retrieved or parsed
    #[error("Failed to load traces from {source_name}: {reason}")]
    Load {
        /// Path or URL the collection was read from
        source_name: String,
        /// What went wrong
        reason: String,
    },

    /// The annotation backend failed an operation
    #[error("Storage error: {0}")]
    Storage(String),

    /// The annotation backend is disabled or could not be opened
    #[error("Annotation storage unavailable")]
    StorageUnavailable,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal setup or drawing failed
    #[error("Terminal error: {0}")]
    Tui(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a load error
    pub fn load(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Load {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a terminal error
    pub fn tui(err: impl ToString) -> Self {
        Self::Tui(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

//! Error types for the chat-features library.
//!
//! This module provides custom error types using `thiserror`. The variants
//! follow the extraction's failure taxonomy: configuration and data-source
//! problems are fatal for a run, model problems are recovered per message.

use thiserror::Error;

/// Errors that can occur while extracting chat features.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Missing or malformed configuration, lexicon file or config section
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failure to open, query or decode the source database
    #[error("Data source error: {0}")]
    DataSource(String),

    /// No model is registered for the requested language
    #[error("No model available for language: {0}")]
    ModelUnavailable(String),

    /// A model failed while processing a single message
    #[error("Model error: {0}")]
    Model(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization errors for structured output cells
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for Result with ExtractError
pub type Result<T> = std::result::Result<T, ExtractError>;

impl From<rusqlite::Error> for ExtractError {
    fn from(err: rusqlite::Error) -> Self {
        Self::DataSource(err.to_string())
    }
}

impl From<config::ConfigError> for ExtractError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

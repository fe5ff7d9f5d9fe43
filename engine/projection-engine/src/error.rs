//! Error types for the projection engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for projection engine operations
pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Errors raised while loading, caching or exporting projections.
///
/// Curve parsing never shows up here: bad curves degrade to empty ones.
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// I/O errors (file reads and writes)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed table input
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source table is missing or empty
    #[error("Source not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// A required column is absent from the source table
    #[error("{file} must include a '{column}' column")]
    MissingColumn { file: String, column: String },

    /// Lookup of a player that is not loaded
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ProjectionError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the catalog store and the local artifacts around it.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// I/O error while reading or writing catalog artifacts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog JSON could not be parsed or serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Mapping CSV could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The catalog file does not exist
    #[error("Catalog not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The catalog parsed but violates an invariant
    #[error("Invalid catalog: {0}")]
    Invalid(String),

    /// Settings file could not be parsed or written
    #[error("Settings error: {0}")]
    Settings(String),
}

impl CatalogError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }
}

//! Error types for catalog loading and prediction selection.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for label catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type for prediction selection.
pub type SelectionResult<T> = Result<T, SelectionError>;

/// Errors raised while loading the label catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Label file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read label file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Label catalog is empty")]
    Empty,
}

/// Contract violations detected by the prediction selector.
///
/// These are never recovered from inside the selector; the caller turns
/// them into an internal fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("probability vector is empty")]
    EmptyInput,

    #[error("probability vector has {probabilities} entries but the label catalog has {labels}")]
    LengthMismatch { probabilities: usize, labels: usize },
}

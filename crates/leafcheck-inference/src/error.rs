//! Error types for preprocessing and inference.

use std::path::PathBuf;
use thiserror::Error;

use leafcheck_models::{CatalogError, SelectionError};

/// Result type for inference operations.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Result type for the full classification pipeline.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Errors from the image preprocessor and the inference engine.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Empty image payload")]
    EmptyImage,

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Invalid input tensor: {0}")]
    InvalidInput(String),

    #[error("Inference failed: {0}")]
    Run(String),

    #[error("Unexpected model output: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InferenceError {
    pub fn model_load(message: impl Into<String>) -> Self {
        Self::ModelLoad(message.into())
    }

    pub fn run(message: impl Into<String>) -> Self {
        Self::Run(message.into())
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::Output(message.into())
    }
}

/// Errors from [`crate::Classifier`], at load time or per request.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Failed to load labels: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Model produces {outputs} classes but the label catalog has {labels}")]
    CatalogMismatch { outputs: usize, labels: usize },
}

//! Shared data models for the LeafCheck backend.
//!
//! This crate provides:
//! - The label catalog and its crop index
//! - The crop-aware prediction selector
//! - Prediction results and their JSON response schema

pub mod catalog;
pub mod crop_index;
pub mod error;
pub mod prediction;
pub mod selector;

// Re-export common types
pub use catalog::{crop_prefix, label_matches_crop, LabelCatalog};
pub use crop_index::CropIndex;
pub use error::{CatalogError, CatalogResult, SelectionError, SelectionResult};
pub use prediction::{format_confidence, CropPrediction, PredictionResponse, PredictionResult};
pub use selector::{select, PredictionSelector};

//! Label catalog loaded once at startup.
//!
//! The catalog is index-aligned with the classifier output: entry `i` names
//! the class whose probability is at position `i` of every probability
//! vector. Order is therefore significant and lines are never dropped or
//! deduplicated while loading.

use std::path::Path;

use tracing::debug;

use crate::error::{CatalogError, CatalogResult};

/// Separator between the crop prefix and the condition in a label.
pub const CROP_SEPARATOR: char = '_';

/// Returns the crop prefix of a label (the text before the first `_`).
///
/// Labels without a separator have no crop prefix.
pub fn crop_prefix(label: &str) -> Option<&str> {
    label.split_once(CROP_SEPARATOR).map(|(crop, _)| crop)
}

/// Returns true if `label` belongs to `crop`, i.e. starts with `"{crop}_"`.
pub fn label_matches_crop(label: &str, crop: &str) -> bool {
    label
        .strip_prefix(crop)
        .is_some_and(|rest| rest.starts_with(CROP_SEPARATOR))
}

/// Ordered, immutable list of class labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCatalog {
    labels: Vec<String>,
}

impl LabelCatalog {
    /// Build a catalog from an ordered list of labels.
    pub fn new(labels: Vec<String>) -> CatalogResult<Self> {
        if labels.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { labels })
    }

    /// Parse a catalog from text, one label per line.
    ///
    /// Each line is trimmed; blank lines are kept as empty labels so that
    /// alignment with the model output never shifts.
    pub fn from_text(text: &str) -> CatalogResult<Self> {
        let labels = text.lines().map(|l| l.trim().to_string()).collect();
        Self::new(labels)
    }

    /// Load a catalog from a label file.
    pub fn from_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::FileNotFound(path.to_path_buf()));
        }

        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = Self::from_text(&text)?;
        debug!(path = %path.display(), labels = catalog.len(), "Loaded label catalog");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

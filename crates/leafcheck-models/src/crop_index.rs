//! Crop name to label index mapping.

use std::collections::HashMap;

use crate::catalog::{crop_prefix, LabelCatalog};

/// Precomputed mapping from crop prefix to the catalog indices of its labels.
///
/// Index lists are in ascending order, so scanning them preserves the
/// "first index wins" tie-break of a full forward scan.
#[derive(Debug, Clone, Default)]
pub struct CropIndex {
    indices: HashMap<String, Vec<usize>>,
    /// Distinct crops in order of first appearance in the catalog.
    crops: Vec<String>,
}

impl CropIndex {
    pub fn build(catalog: &LabelCatalog) -> Self {
        let mut index = Self::default();
        for (i, label) in catalog.iter().enumerate() {
            let Some(crop) = crop_prefix(label) else {
                continue;
            };
            match index.indices.get_mut(crop) {
                Some(list) => list.push(i),
                None => {
                    index.indices.insert(crop.to_string(), vec![i]);
                    index.crops.push(crop.to_string());
                }
            }
        }
        index
    }

    /// Catalog indices of the labels belonging to `crop`.
    pub fn indices(&self, crop: &str) -> &[usize] {
        self.indices.get(crop).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn crops(&self) -> &[String] {
        &self.crops
    }
}

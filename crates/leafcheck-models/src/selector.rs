//! Crop-aware prediction selection.
//!
//! Turns a probability vector aligned with the label catalog into a
//! [`PredictionResult`]:
//!
//! 1. The global best class is the first index holding the maximum
//!    probability.
//! 2. When a crop filter is given and the global best does not already
//!    belong to that crop, the best class among the crop's labels is
//!    reported as well (first index wins on ties).
//!
//! Selection is a pure function of its inputs and holds no state.

use crate::catalog::{label_matches_crop, LabelCatalog, CROP_SEPARATOR};
use crate::crop_index::CropIndex;
use crate::error::{SelectionError, SelectionResult};
use crate::prediction::{CropPrediction, PredictionResult};

/// Index of the largest probability among `candidates`.
///
/// The first candidate initializes the running best and only a strictly
/// greater value replaces it, so ties keep the earliest candidate.
fn argmax_over<I>(probabilities: &[f32], candidates: I) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    let mut best: Option<usize> = None;
    for i in candidates {
        match best {
            Some(b) if probabilities[i] <= probabilities[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

fn to_percent(probability: f32) -> f64 {
    f64::from(probability) * 100.0
}

fn check_lengths(probabilities: usize, labels: usize) -> SelectionResult<()> {
    if probabilities != labels {
        return Err(SelectionError::LengthMismatch {
            probabilities,
            labels,
        });
    }
    if probabilities == 0 {
        return Err(SelectionError::EmptyInput);
    }
    Ok(())
}

/// Normalizes the optional crop filter; an empty string means no filter.
fn active_filter(crop_filter: Option<&str>) -> Option<&str> {
    crop_filter.filter(|c| !c.is_empty())
}

/// Select the main and crop-specific predictions by scanning every label.
pub fn select<S: AsRef<str>>(
    probabilities: &[f32],
    labels: &[S],
    crop_filter: Option<&str>,
) -> SelectionResult<PredictionResult> {
    check_lengths(probabilities.len(), labels.len())?;

    let main_index = argmax_over(probabilities, 0..probabilities.len())
        .ok_or(SelectionError::EmptyInput)?;
    let main_class = labels[main_index].as_ref();

    let crop = match active_filter(crop_filter) {
        Some(filter) if !label_matches_crop(main_class, filter) => {
            let matching = (0..labels.len()).filter(|&i| label_matches_crop(labels[i].as_ref(), filter));
            argmax_over(probabilities, matching).map(|i| CropPrediction {
                class: labels[i].as_ref().to_string(),
                confidence_percent: to_percent(probabilities[i]),
            })
        }
        _ => None,
    };

    Ok(PredictionResult {
        main_class: main_class.to_string(),
        main_confidence_percent: to_percent(probabilities[main_index]),
        crop,
    })
}

/// Selector bound to a loaded catalog and its precomputed crop index.
///
/// Produces exactly the same results as [`select`]; filters without a `_`
/// are resolved through the crop index instead of a full label scan.
#[derive(Debug, Clone)]
pub struct PredictionSelector {
    catalog: LabelCatalog,
    index: CropIndex,
}

impl PredictionSelector {
    pub fn new(catalog: LabelCatalog) -> Self {
        let index = CropIndex::build(&catalog);
        Self { catalog, index }
    }

    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    pub fn crop_index(&self) -> &CropIndex {
        &self.index
    }

    pub fn select(
        &self,
        probabilities: &[f32],
        crop_filter: Option<&str>,
    ) -> SelectionResult<PredictionResult> {
        let labels = self.catalog.as_slice();
        check_lengths(probabilities.len(), labels.len())?;

        let filter = match active_filter(crop_filter) {
            // A separator in the filter can straddle the crop boundary, which
            // the index cannot answer.
            Some(f) if f.contains(CROP_SEPARATOR) => return select(probabilities, labels, Some(f)),
            other => other,
        };

        let main_index = argmax_over(probabilities, 0..probabilities.len())
            .ok_or(SelectionError::EmptyInput)?;
        let main_class = &labels[main_index];

        let crop = match filter {
            Some(filter) if !label_matches_crop(main_class, filter) => {
                let candidates = self.index.indices(filter).iter().copied();
                argmax_over(probabilities, candidates).map(|i| CropPrediction {
                    class: labels[i].clone(),
                    confidence_percent: to_percent(probabilities[i]),
                })
            }
            _ => None,
        };

        Ok(PredictionResult {
            main_class: main_class.clone(),
            main_confidence_percent: to_percent(probabilities[main_index]),
            crop,
        })
    }
}

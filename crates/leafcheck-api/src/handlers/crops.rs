//! Crop listing handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CropsResponse {
    /// Distinct crop prefixes accepted by the `crop` form field.
    pub crops: Vec<String>,
    /// Number of classes known to the model.
    pub labels: usize,
}

/// List the crops present in the label catalog, in catalog order.
pub async fn list_crops(State(state): State<AppState>) -> ApiResult<Json<CropsResponse>> {
    let classifier = state.classifier()?;
    Ok(Json(CropsResponse {
        crops: classifier.crops().to_vec(),
        labels: classifier.catalog().len(),
    }))
}

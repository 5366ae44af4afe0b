//! Leaf image prediction handler.

use std::sync::Arc;

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::Json;
use tracing::{error, info};

use leafcheck_models::PredictionResponse;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Form field holding the uploaded image.
pub const FILE_FIELD: &str = "file";
/// Optional form field naming the crop to focus on.
pub const CROP_FIELD: &str = "crop";

/// Parsed multipart upload.
#[derive(Debug, Default)]
struct PredictForm {
    /// File name and content of the first `file` part, if any.
    file: Option<(String, Vec<u8>)>,
    crop: Option<String>,
}

impl PredictForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Multipart error: {e}")))?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some(FILE_FIELD) if form.file.is_none() => {
                    // A plain text field named `file` is not an upload.
                    let Some(file_name) = field.file_name().map(str::to_string) else {
                        continue;
                    };
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Multipart error: {e}")))?;
                    form.file = Some((file_name, bytes.to_vec()));
                }
                Some(CROP_FIELD) if form.crop.is_none() => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Multipart error: {e}")))?;
                    form.crop = Some(text);
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Classify an uploaded leaf image.
///
/// Multipart fields: `file` (required image upload) and `crop` (optional crop
/// prefix such as `maiz` or `cafe`).
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PredictionResponse>> {
    let result = run_prediction(&state, multipart).await;

    match &result {
        Ok((response, crop_filter)) => {
            metrics::record_prediction("ok", crop_filter.is_some());
            if let (Some(crop), Some(_)) = (crop_filter, &response.crop_specific_prediction) {
                metrics::record_crop_prediction(crop);
            }
        }
        Err(e) => metrics::record_prediction(e.kind(), false),
    }

    result.map(|(response, _)| Json(response))
}

async fn run_prediction(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(PredictionResponse, Option<String>)> {
    let classifier = Arc::clone(state.classifier()?);

    // Anything that is not a multipart form carries no file.
    let multipart = multipart.map_err(|_| ApiError::MissingFile)?;
    let form = PredictForm::read(multipart).await?;

    let (file_name, image) = form.file.ok_or(ApiError::MissingFile)?;
    if file_name.is_empty() {
        return Err(ApiError::EmptyFilename);
    }

    let crop_filter = form.crop.filter(|c| !c.is_empty());
    let crop = crop_filter.clone();

    let result = tokio::task::spawn_blocking(move || classifier.classify(&image, crop.as_deref()))
        .await
        .map_err(|e| ApiError::internal(format!("inference task failed: {e}")))?;

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            error!(file = %file_name, crop = ?crop_filter, "Error during prediction: {}", e);
            return Err(e.into());
        }
    };

    info!(
        file = %file_name,
        crop = ?crop_filter,
        main = %result.main_class,
        main_confidence = result.main_confidence_percent,
        crop_specific = ?result.crop_class(),
        "Prediction completed"
    );

    Ok((PredictionResponse::from(&result), crop_filter))
}

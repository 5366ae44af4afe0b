//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::{AppState, ModelStatus};

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub model: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<usize>,
}

/// Readiness check endpoint (readiness probe).
/// Ready once the model and label catalog are loaded.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    match &state.model {
        ModelStatus::Ready(classifier) => Ok(Json(ReadinessResponse {
            status: "ready".to_string(),
            checks: ReadinessChecks {
                model: CheckStatus {
                    status: "ok".to_string(),
                    error: None,
                    engine: Some(classifier.engine_name().to_string()),
                    labels: Some(classifier.catalog().len()),
                },
            },
        })),
        ModelStatus::Unavailable(reason) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "degraded".to_string(),
                checks: ReadinessChecks {
                    model: CheckStatus {
                        status: "error".to_string(),
                        error: Some(reason.clone()),
                        engine: None,
                        labels: None,
                    },
                },
            }),
        )),
    }
}

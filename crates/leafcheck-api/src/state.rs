//! Application state.

use std::sync::Arc;

use leafcheck_inference::{Classifier, ImagePreprocessor};
use tracing::error;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Whether the model and labels were loaded at startup.
#[derive(Clone)]
pub enum ModelStatus {
    Ready(Arc<Classifier>),
    /// Loading failed; every prediction is rejected. Holds the load error.
    Unavailable(String),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub model: ModelStatus,
}

impl AppState {
    /// Load the classifier described by `config`.
    ///
    /// A load failure does not abort startup: the state comes up degraded
    /// so health probes keep answering and predictions fail fast.
    pub async fn load(config: ApiConfig) -> Self {
        let model_path = config.model_path.clone();
        let labels_path = config.labels_path.clone();
        let preprocessor =
            ImagePreprocessor::new(config.input_size, config.input_size, config.pixel_scaling);

        let loaded = tokio::task::spawn_blocking(move || {
            Classifier::load(&model_path, &labels_path, preprocessor)
        })
        .await;

        let model = match loaded {
            Ok(Ok(classifier)) => ModelStatus::Ready(Arc::new(classifier)),
            Ok(Err(e)) => {
                error!(
                    model = %config.model_path.display(),
                    labels = %config.labels_path.display(),
                    "Failed to load model or labels: {}", e
                );
                ModelStatus::Unavailable(e.to_string())
            }
            Err(e) => {
                error!("Model loading task failed: {}", e);
                ModelStatus::Unavailable(e.to_string())
            }
        };

        Self { config, model }
    }

    /// State around an already built classifier.
    pub fn with_classifier(config: ApiConfig, classifier: Arc<Classifier>) -> Self {
        Self {
            config,
            model: ModelStatus::Ready(classifier),
        }
    }

    /// State for a process whose model failed to load.
    pub fn degraded(config: ApiConfig, reason: impl Into<String>) -> Self {
        Self {
            config,
            model: ModelStatus::Unavailable(reason.into()),
        }
    }

    /// The loaded classifier, or `ModelNotLoaded` when degraded.
    pub fn classifier(&self) -> ApiResult<&Arc<Classifier>> {
        match &self.model {
            ModelStatus::Ready(classifier) => Ok(classifier),
            ModelStatus::Unavailable(_) => Err(ApiError::ModelNotLoaded),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.model, ModelStatus::Ready(_))
    }
}

//! End-to-end leaf classification: decode, infer, select.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;
use tracing::{debug, info};

use leafcheck_models::{LabelCatalog, PredictionResult, PredictionSelector};

use crate::engine::{InferenceEngine, TfliteEngine};
use crate::error::{ClassifyError, ClassifyResult};
use crate::preprocess::ImagePreprocessor;

/// Histogram of preprocessing + inference time, in seconds.
pub const INFERENCE_DURATION_SECONDS: &str = "leafcheck_inference_duration_seconds";

/// Loaded model, label catalog and selection policy.
///
/// Built once at startup and shared read-only between requests.
pub struct Classifier {
    preprocessor: ImagePreprocessor,
    engine: Arc<dyn InferenceEngine>,
    selector: PredictionSelector,
}

impl Classifier {
    /// Assemble a classifier, checking that the model and catalog agree on
    /// the number of classes when the model declares it.
    pub fn new(
        preprocessor: ImagePreprocessor,
        engine: Arc<dyn InferenceEngine>,
        catalog: LabelCatalog,
    ) -> ClassifyResult<Self> {
        if let Some(outputs) = engine.output_len() {
            if outputs != catalog.len() {
                return Err(ClassifyError::CatalogMismatch {
                    outputs,
                    labels: catalog.len(),
                });
            }
        }

        Ok(Self {
            preprocessor,
            engine,
            selector: PredictionSelector::new(catalog),
        })
    }

    /// Load a TFLite model and its label file from disk.
    pub fn load(
        model_path: &Path,
        labels_path: &Path,
        preprocessor: ImagePreprocessor,
    ) -> ClassifyResult<Self> {
        let catalog = LabelCatalog::from_file(labels_path)?;
        let engine = TfliteEngine::load(
            model_path,
            preprocessor.height() as usize,
            preprocessor.width() as usize,
        )?;

        let classifier = Self::new(preprocessor, Arc::new(engine), catalog)?;
        info!(
            labels = classifier.catalog().len(),
            crops = classifier.selector.crop_index().crops().len(),
            scaling = %preprocessor.scaling(),
            "Classifier ready"
        );
        Ok(classifier)
    }

    pub fn catalog(&self) -> &LabelCatalog {
        self.selector.catalog()
    }

    /// Distinct crop prefixes in catalog order.
    pub fn crops(&self) -> &[String] {
        self.selector.crop_index().crops()
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Classify one encoded image, optionally focusing on a crop.
    ///
    /// CPU-bound; async callers should run it on a blocking thread.
    pub fn classify(&self, image: &[u8], crop_filter: Option<&str>) -> ClassifyResult<PredictionResult> {
        let start = Instant::now();

        let tensor = self.preprocessor.prepare(image)?;
        let probabilities = self.engine.infer(&tensor)?;

        let elapsed = start.elapsed();
        histogram!(INFERENCE_DURATION_SECONDS, "engine" => self.engine.name())
            .record(elapsed.as_secs_f64());

        let result = self.selector.select(&probabilities, crop_filter)?;

        debug!(
            main = %result.main_class,
            crop = ?result.crop_class(),
            duration_ms = %elapsed.as_millis(),
            "Classified image"
        );
        Ok(result)
    }
}

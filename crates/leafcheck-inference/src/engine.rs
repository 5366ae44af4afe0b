//! Inference engines turning an image tensor into class probabilities.

use std::io::Cursor;
use std::path::Path;

use tract_tflite::prelude::*;
use tracing::{debug, info};

use crate::error::{InferenceError, InferenceResult};
use crate::preprocess::{ImageTensor, CHANNELS};

/// Runs a classifier over a preprocessed image.
///
/// Implementations must be shareable across request handlers; a call only
/// reads the engine and its input.
pub trait InferenceEngine: Send + Sync {
    /// One score per class, index-aligned with the label catalog.
    fn infer(&self, input: &ImageTensor) -> InferenceResult<Vec<f32>>;

    /// Number of classes, when the model declares a static output shape.
    fn output_len(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &'static str;
}

/// Element type of the model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputType {
    F32,
    U8,
}

/// TensorFlow Lite model executed with tract.
///
/// The model is optimized once for a fixed `[1, H, W, 3]` input. The
/// resulting plan is immutable, so concurrent calls need no lock.
pub struct TfliteEngine {
    plan: TypedRunnableModel<TypedModel>,
    input_shape: [usize; 4],
    input_type: InputType,
    output_len: Option<usize>,
}

impl TfliteEngine {
    /// Load a `.tflite` file for the given input size.
    pub fn load(model_path: &Path, height: usize, width: usize) -> InferenceResult<Self> {
        if !model_path.exists() {
            return Err(InferenceError::ModelNotFound(model_path.to_path_buf()));
        }

        let bytes = std::fs::read(model_path)?;
        let engine = Self::from_bytes(&bytes, height, width)?;

        info!(
            path = %model_path.display(),
            input = ?engine.input_shape,
            classes = ?engine.output_len,
            "Loaded TFLite model"
        );
        Ok(engine)
    }

    /// Build an engine from an in-memory TFLite flatbuffer.
    pub fn from_bytes(bytes: &[u8], height: usize, width: usize) -> InferenceResult<Self> {
        if bytes.is_empty() {
            return Err(InferenceError::model_load("model file is empty"));
        }

        let mut cursor = Cursor::new(bytes);
        let model = tract_tflite::tflite()
            .model_for_read(&mut cursor)
            .map_err(|e| InferenceError::model_load(format!("TFLite parse error: {e}")))?;

        let inlet = model
            .input_outlets()
            .map_err(|e| InferenceError::model_load(format!("{e}")))?
            .first()
            .copied()
            .ok_or_else(|| InferenceError::model_load("model declares no inputs"))?;
        let declared = model
            .outlet_fact(inlet)
            .map_err(|e| InferenceError::model_load(format!("{e}")))?
            .datum_type;

        let input_shape = [1, height, width, CHANNELS];
        let input_type = if declared == f32::datum_type() {
            InputType::F32
        } else if declared == u8::datum_type() {
            InputType::U8
        } else {
            return Err(InferenceError::model_load(format!(
                "unsupported input type {declared:?} (expected F32 or U8)"
            )));
        };
        let fact = TypedFact::dt_shape(declared, input_shape);

        let optimized = model
            .with_input_fact(0, fact)
            .and_then(|m| m.into_optimized())
            .map_err(|e| InferenceError::model_load(format!("TFLite optimize error: {e}")))?;

        let output_len = optimized
            .output_fact(0)
            .ok()
            .and_then(|f| f.shape.as_concrete().map(|dims| dims.iter().product()));

        let plan = optimized
            .into_runnable()
            .map_err(|e| InferenceError::model_load(format!("TFLite plan error: {e}")))?;

        debug!(?input_type, "TFLite input type");

        Ok(Self {
            plan,
            input_shape,
            input_type,
            output_len,
        })
    }
}

/// Build the model input for one image.
///
/// Quantized models take the resized 8-bit pixels as they are; float models
/// take the scaled values.
fn build_input(
    input_type: InputType,
    expected_shape: [usize; 4],
    input: &ImageTensor,
) -> InferenceResult<Tensor> {
    let shape = input.shape();
    if shape != expected_shape {
        return Err(InferenceError::InvalidInput(format!(
            "expected shape {expected_shape:?}, got {shape:?}"
        )));
    }

    let tensor = match input_type {
        InputType::F32 => Tensor::from_shape(&shape, &input.data),
        InputType::U8 => Tensor::from_shape(&shape, &input.pixels),
    };
    tensor.map_err(|e| InferenceError::InvalidInput(e.to_string()))
}

/// Flatten a batch-of-one output into the probability vector.
fn output_scores(output: &Tensor) -> InferenceResult<Vec<f32>> {
    let view = output
        .to_array_view::<f32>()
        .map_err(|e| InferenceError::output(format!("output is not f32: {e}")))?;
    Ok(view.iter().copied().collect())
}

impl InferenceEngine for TfliteEngine {
    fn infer(&self, input: &ImageTensor) -> InferenceResult<Vec<f32>> {
        let tensor = build_input(self.input_type, self.input_shape, input)?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::run(format!("{e}")))?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::output("model produced no outputs"))?;

        output_scores(output)
    }

    fn output_len(&self) -> Option<usize> {
        self.output_len
    }

    fn name(&self) -> &'static str {
        "tflite"
    }
}

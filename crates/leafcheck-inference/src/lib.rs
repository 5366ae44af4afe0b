//! Image preprocessing and model inference for LeafCheck.
//!
//! Architecture:
//! - [`ImagePreprocessor`]: encoded upload to a `[1, H, W, 3]` f32 tensor
//! - [`InferenceEngine`]: tensor to per-class probabilities
//!   ([`TfliteEngine`] runs `.tflite` models through tract)
//! - [`Classifier`]: preprocessor + engine + crop-aware selector

pub mod classifier;
pub mod engine;
pub mod error;
pub mod preprocess;

pub use classifier::Classifier;
pub use engine::{InferenceEngine, TfliteEngine};
pub use error::{ClassifyError, ClassifyResult, InferenceError, InferenceResult};
pub use preprocess::{ImagePreprocessor, ImageTensor, PixelScaling, DEFAULT_INPUT_SIZE};

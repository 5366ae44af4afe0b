//! Image preprocessing: encoded bytes to a fixed-size NHWC float tensor.

use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::DynamicImage;
use thiserror::Error;

use crate::error::{InferenceError, InferenceResult};

/// Default square input size of the leaf classifier.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Number of color channels fed to the model (RGB).
pub const CHANNELS: usize = 3;

/// How 8-bit pixel values are mapped to floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelScaling {
    /// Unscaled 0-255 values; the model does its own rescaling.
    #[default]
    Raw,
    /// 0-1 range.
    Unit,
    /// -1 to 1 range.
    Symmetric,
}

impl PixelScaling {
    pub const ALL: &'static [PixelScaling] = &[
        PixelScaling::Raw,
        PixelScaling::Unit,
        PixelScaling::Symmetric,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PixelScaling::Raw => "raw",
            PixelScaling::Unit => "unit",
            PixelScaling::Symmetric => "symmetric",
        }
    }

    #[inline]
    pub fn apply(&self, value: u8) -> f32 {
        let v = f32::from(value);
        match self {
            PixelScaling::Raw => v,
            PixelScaling::Unit => v / 255.0,
            PixelScaling::Symmetric => v / 127.5 - 1.0,
        }
    }
}

impl fmt::Display for PixelScaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PixelScaling {
    type Err = PixelScalingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "raw" | "none" => Ok(PixelScaling::Raw),
            "unit" | "0_1" => Ok(PixelScaling::Unit),
            "symmetric" | "-1_1" => Ok(PixelScaling::Symmetric),
            _ => Err(PixelScalingParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown pixel scaling: {0}")]
pub struct PixelScalingParseError(String);

/// A single image as a `[1, height, width, 3]` row-major tensor.
///
/// `data` holds the scaled floats; `pixels` keeps the resized 8-bit RGB
/// values for models that take quantized input.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub height: usize,
    pub width: usize,
    pub data: Vec<f32>,
    pub pixels: Vec<u8>,
}

impl ImageTensor {
    pub fn shape(&self) -> [usize; 4] {
        [1, self.height, self.width, CHANNELS]
    }
}

/// Decodes uploads and resizes them to the model input size.
#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    width: u32,
    height: u32,
    scaling: PixelScaling,
    filter: FilterType,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE, PixelScaling::default())
    }
}

impl ImagePreprocessor {
    /// Bicubic (Catmull-Rom) resampling is used for resizing.
    pub fn new(width: u32, height: u32, scaling: PixelScaling) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            scaling,
            filter: FilterType::CatmullRom,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scaling(&self) -> PixelScaling {
        self.scaling
    }

    /// Decode encoded image bytes (any format `image` can sniff) into a tensor.
    pub fn prepare(&self, bytes: &[u8]) -> InferenceResult<ImageTensor> {
        if bytes.is_empty() {
            return Err(InferenceError::EmptyImage);
        }
        let image = image::load_from_memory(bytes)?;
        Ok(self.prepare_image(&image))
    }

    /// Convert an already decoded image: RGB conversion, exact resize, scaling.
    pub fn prepare_image(&self, image: &DynamicImage) -> ImageTensor {
        let rgb = image.to_rgb8();
        let resized = imageops::resize(&rgb, self.width, self.height, self.filter);

        let pixels = resized.into_raw();
        let data = pixels.iter().map(|&v| self.scaling.apply(v)).collect();

        ImageTensor {
            height: self.height as usize,
            width: self.width as usize,
            data,
            pixels,
        }
    }
}

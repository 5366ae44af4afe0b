//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use leafcheck_inference::{PixelScaling, DEFAULT_INPUT_SIZE};
use tracing::warn;

fn parse_var<T, F>(var: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    var(key).and_then(|s| s.trim().parse().ok())
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second (per client IP) on `/predict`
    pub rate_limit_rps: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// TFLite model file
    pub model_path: PathBuf,
    /// Label file, one class per line
    pub labels_path: PathBuf,
    /// Square model input size in pixels
    pub input_size: u32,
    /// Pixel value scaling applied before inference
    pub pixel_scaling: PixelScaling,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024, // 10MB
            model_path: PathBuf::from("frontend/public/model.tflite"),
            labels_path: PathBuf::from("frontend/public/class_names.txt"),
            input_size: DEFAULT_INPUT_SIZE,
            pixel_scaling: PixelScaling::Raw,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup, falling back to defaults.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let pixel_scaling = match var("PIXEL_SCALING") {
            Some(s) => s.parse().unwrap_or_else(|e| {
                warn!("{}, using {}", e, defaults.pixel_scaling);
                defaults.pixel_scaling
            }),
            None => defaults.pixel_scaling,
        };

        Self {
            host: var("API_HOST").unwrap_or(defaults.host),
            port: parse_var(&var, "API_PORT").unwrap_or(defaults.port),
            cors_origins: var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: parse_var(&var, "RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            request_timeout: parse_var(&var, "REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: parse_var(&var, "MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            model_path: var("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model_path),
            labels_path: var("LABELS_PATH").map(PathBuf::from).unwrap_or(defaults.labels_path),
            input_size: parse_var(&var, "INPUT_SIZE")
                .filter(|&n: &u32| n > 0)
                .unwrap_or(defaults.input_size),
            pixel_scaling,
            metrics_enabled: var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }
}

//! Axum HTTP API server for leaf disease classification.
//!
//! This crate provides:
//! - `POST /predict`: crop-aware classification of an uploaded leaf image
//! - `GET /crops`: crops known to the loaded label catalog
//! - Health/readiness probes, CORS, rate limiting and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, ModelStatus};

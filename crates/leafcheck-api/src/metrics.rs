//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "leafcheck_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "leafcheck_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "leafcheck_http_requests_in_flight";

    // Prediction metrics
    pub const PREDICTIONS_TOTAL: &str = "leafcheck_predictions_total";
    pub const CROP_PREDICTIONS_TOTAL: &str = "leafcheck_crop_specific_predictions_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "leafcheck_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a prediction request outcome ("ok" or an error kind).
pub fn record_prediction(outcome: &str, crop_filter: bool) {
    let labels = [
        ("outcome", outcome.to_string()),
        ("crop_filter", crop_filter.to_string()),
    ];
    counter!(names::PREDICTIONS_TOTAL, &labels).increment(1);
}

/// Record a response that carried a crop-specific prediction.
pub fn record_crop_prediction(crop: &str) {
    let labels = [("crop", crop.to_string())];
    counter!(names::CROP_PREDICTIONS_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse unknown paths so scanners cannot blow up label cardinality.
fn metric_path(path: &str) -> &str {
    match path {
        "/predict" | "/crops" | "/health" | "/healthz" | "/ready" | "/metrics" => path,
        _ => "other",
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = metric_path(request.uri().path()).to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_path() {
        assert_eq!(metric_path("/predict"), "/predict");
        assert_eq!(metric_path("/ready"), "/ready");
        assert_eq!(metric_path("/wp-admin/setup.php"), "other");
    }
}

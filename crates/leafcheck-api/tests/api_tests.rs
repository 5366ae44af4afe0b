//! API integration tests.
//!
//! The router is driven in-process with a fixed-output inference engine, so
//! no model file is needed.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use tower::ServiceExt;

use leafcheck_api::{create_router, ApiConfig, AppState};
use leafcheck_inference::{
    Classifier, ImagePreprocessor, ImageTensor, InferenceEngine, InferenceError, PixelScaling,
};
use leafcheck_models::LabelCatalog;

const BOUNDARY: &str = "leafcheck-test-boundary";

struct FixedEngine(Vec<f32>);

impl InferenceEngine for FixedEngine {
    fn infer(&self, _input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

struct SlowEngine(Duration);

impl InferenceEngine for SlowEngine {
    fn infer(&self, _input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        std::thread::sleep(self.0);
        Ok(vec![0.10, 0.70, 0.20])
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

fn router_with_engine(config: ApiConfig, engine: Arc<dyn InferenceEngine>) -> Router {
    let catalog = LabelCatalog::from_text("maiz_sano\nmaiz_roya\ncafe_sano\n").unwrap();
    let classifier =
        Classifier::new(ImagePreprocessor::new(8, 8, PixelScaling::Raw), engine, catalog).unwrap();

    let state = AppState::with_classifier(config, Arc::new(classifier));
    create_router(state, None)
}

fn router_with_scores(scores: Vec<f32>) -> Router {
    router_with_engine(ApiConfig::default(), Arc::new(FixedEngine(scores)))
}

fn test_router() -> Router {
    router_with_scores(vec![0.10, 0.70, 0.20])
}

fn degraded_router() -> Router {
    let state = AppState::degraded(ApiConfig::default(), "Model not found: model.tflite");
    create_router(state, None)
}

fn leaf_png() -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 12, Rgb([40, 140, 60])))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

enum Part<'a> {
    File {
        name: &'a str,
        file_name: &'a str,
        data: Vec<u8>,
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

fn multipart_body(parts: Vec<Part<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                file_name,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn predict_request(parts: Vec<Part<'_>>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn leaf_upload(crop: Option<&str>) -> Request<Body> {
    let mut parts = vec![Part::File {
        name: "file",
        file_name: "hoja.png",
        data: leaf_png(),
    }];
    if let Some(crop) = crop {
        parts.push(Part::Text {
            name: "crop",
            value: crop,
        });
    }
    predict_request(parts)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_predict_with_crop_outside_main() {
    let (status, body) = send(test_router(), leaf_upload(Some("cafe"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "main_prediction": "maiz_roya",
            "main_confidence": "70.00%",
            "crop_specific_prediction": "cafe_sano",
            "crop_specific_confidence": "20.00%",
        })
    );
}

#[tokio::test]
async fn test_predict_crop_matching_main_is_null() {
    let (status, body) = send(test_router(), leaf_upload(Some("maiz"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["main_prediction"], "maiz_roya");
    assert!(body["crop_specific_prediction"].is_null());
    assert!(body["crop_specific_confidence"].is_null());
}

#[tokio::test]
async fn test_predict_unknown_crop_is_null() {
    let (status, body) = send(test_router(), leaf_upload(Some("trigo"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["main_prediction"], "maiz_roya");
    assert_eq!(body["main_confidence"], "70.00%");
    assert!(body["crop_specific_prediction"].is_null());
}

#[tokio::test]
async fn test_predict_without_or_empty_crop() {
    for crop in [None, Some("")] {
        let (status, body) = send(test_router(), leaf_upload(crop)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["main_prediction"], "maiz_roya");
        assert!(body["crop_specific_prediction"].is_null());
        assert!(body["crop_specific_confidence"].is_null());
    }
}

#[tokio::test]
async fn test_predict_degraded_rejects_before_reading_upload() {
    let (status, body) = send(degraded_router(), predict_request(vec![])).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Modelo no cargado en el backend" }));
}

#[tokio::test]
async fn test_predict_missing_file() {
    let request = predict_request(vec![Part::Text {
        name: "crop",
        value: "cafe",
    }]);
    let (status, body) = send(test_router(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No se encontró el archivo" }));
}

#[tokio::test]
async fn test_predict_text_field_named_file_is_not_an_upload() {
    let request = predict_request(vec![Part::Text {
        name: "file",
        value: "hoja.png",
    }]);
    let (status, body) = send(test_router(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No se encontró el archivo");
}

#[tokio::test]
async fn test_predict_non_multipart_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(test_router(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No se encontró el archivo");
}

#[tokio::test]
async fn test_predict_empty_filename() {
    let request = predict_request(vec![Part::File {
        name: "file",
        file_name: "",
        data: Vec::new(),
    }]);
    let (status, body) = send(test_router(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No se seleccionó ningún archivo" }));
}

#[tokio::test]
async fn test_predict_undecodable_image_is_internal_error() {
    let request = predict_request(vec![Part::File {
        name: "file",
        file_name: "notes.txt",
        data: b"these are not pixels".to_vec(),
    }]);
    let (status, body) = send(test_router(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Error interno del servidor: Failed to decode image"));
}

#[tokio::test]
async fn test_predict_engine_length_mismatch_is_internal_error() {
    let (status, body) = send(router_with_scores(vec![0.5, 0.5]), leaf_upload(None)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Error interno del servidor:"));
    assert!(message.contains("2 entries"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(degraded_router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let (status, body) = send(test_router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["model"]["labels"], 3);
    assert_eq!(body["checks"]["model"]["engine"], "fixed");
}

#[tokio::test]
async fn test_ready_endpoint_degraded() {
    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let (status, body) = send(degraded_router(), request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["model"]["error"], "Model not found: model.tflite");
}

#[tokio::test]
async fn test_crops_endpoint() {
    let request = Request::builder().uri("/crops").body(Body::empty()).unwrap();
    let (status, body) = send(test_router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "crops": ["maiz", "cafe"], "labels": 3 }));
}

#[tokio::test]
async fn test_crops_endpoint_degraded() {
    let request = Request::builder().uri("/crops").body(Body::empty()).unwrap();
    let (status, body) = send(degraded_router(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Modelo no cargado en el backend");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "req-1234")
        .body(Body::empty())
        .unwrap();
    let response = test_router().oneshot(request).await.unwrap();

    assert_eq!(response.headers()["X-Request-ID"], "req-1234");
    assert_eq!(response.headers()["X-Content-Type-Options"], "nosniff");
}

#[tokio::test]
async fn test_metrics_endpoint_absent_when_disabled() {
    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = test_router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rate_limited_predict_returns_json_error() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        ..ApiConfig::default()
    };
    let app = router_with_engine(config, Arc::new(FixedEngine(vec![0.10, 0.70, 0.20])));

    let client = |request: Request<Body>| {
        let (mut parts, body) = request.into_parts();
        parts
            .headers
            .insert("X-Forwarded-For", "203.0.113.9".parse().unwrap());
        Request::from_parts(parts, body)
    };

    let first = app.clone().oneshot(client(leaf_upload(None))).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(client(leaf_upload(None))).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers()[header::RETRY_AFTER], "1");

    let bytes = axum::body::to_bytes(second.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        json!({ "error": "Rate limit exceeded. Please try again later." })
    );
}

#[tokio::test]
async fn test_slow_prediction_times_out() {
    let config = ApiConfig {
        request_timeout: Duration::from_millis(50),
        ..ApiConfig::default()
    };
    let app = router_with_engine(config, Arc::new(SlowEngine(Duration::from_millis(500))));

    let response = app.oneshot(leaf_upload(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use burn::backend::NdArray;
use burn::tensor::Tensor;
use futures::future::join_all;
use models::ModelAPI;
use predictor::app_state::AppState;
use predictor::server::{MAX_BODY_BYTES, router};
use runtime::{ArtifactLoader, ArtifactLocator, ModelCache};
use serde::Serialize;
use serde_json::{Value, json};
use tower::ServiceExt;
use types::config::server_config::ServerConfig;
use types::error::{InferenceError, LoadError, LoadResult, ModelResult};

type B = NdArray<f32>;

const EXAMPLE_INPUT: [f64; 11] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0];

// ---------------------------------------------------------------------------
// Stub engines
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Behavior {
    /// Mean of the row.
    Mean,
    /// `[sum, mean]` of the row.
    Wide,
    /// Rejects every tensor.
    Reject,
    /// Panics inside inference.
    Panic,
}

struct StubModel {
    behavior: Behavior,
    device: <B as burn::prelude::Backend>::Device,
}

#[async_trait]
impl ModelAPI for StubModel {
    type Backend = B;

    fn device(&self) -> &<B as burn::prelude::Backend>::Device {
        &self.device
    }

    async fn predict(&self, input: Tensor<B, 2>) -> ModelResult<Tensor<B, 2>> {
        let features = input.dims()[1] as f32;
        match self.behavior {
            Behavior::Mean => Ok(input.sum_dim(1).div_scalar(features)),
            Behavior::Wide => {
                let sum = input.clone().sum_dim(1);
                let mean = input.sum_dim(1).div_scalar(features);
                Ok(Tensor::cat(vec![sum, mean], 1))
            }
            Behavior::Reject => Err(InferenceError::ShapeMismatch {
                expected: vec![1, 12],
                actual: input.dims().to_vec(),
            }),
            Behavior::Panic => panic!("engine exploded"),
        }
    }
}

// ---------------------------------------------------------------------------
// Stub loader that counts invocations
// ---------------------------------------------------------------------------

struct StubLoader {
    behavior: Behavior,
    loads: AtomicUsize,
    /// Number of upcoming loads that fail.
    failures: AtomicUsize,
    delay: Duration,
}

impl StubLoader {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            loads: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing(self, times: usize) -> Self {
        self.failures.store(times, Ordering::SeqCst);
        self
    }

    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactLoader for StubLoader {
    type Model = StubModel;

    async fn load(&self, _locator: &ArtifactLocator) -> LoadResult<StubModel> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(LoadError::NotFound("/models/missing.safetensors".to_string()));
        }
        Ok(StubModel { behavior: self.behavior, device: Default::default() })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Body the form client sends.
#[derive(Serialize)]
struct PredictRequest {
    input: Vec<f64>,
}

fn setup(loader: StubLoader, config: ServerConfig) -> (Router, Arc<AppState<StubLoader>>, Arc<StubLoader>) {
    let loader = Arc::new(loader);
    let cache = ModelCache::new(loader.clone(), "stub/model.safetensors".parse().unwrap());
    let state = Arc::new(AppState::new(cache, config));
    (router(state.clone()), state, loader)
}

fn predict_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn example_request() -> Request<Body> {
    let request = PredictRequest { input: EXAMPLE_INPUT.to_vec() };
    predict_request(serde_json::to_string(&request).unwrap())
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mean_stub_predicts_six() {
    let (app, _, _) = setup(StubLoader::new(Behavior::Mean), ServerConfig::default());

    let response = send(&app, example_request()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    let body = json_body(response).await;
    assert_eq!(body, json!({ "prediction": 6.0 }));
    // `6.0` and `6` are the same JSON number.
    assert_eq!(body["prediction"].as_f64(), Some(6.0));
}

#[tokio::test]
async fn multi_output_is_an_array() {
    let (app, _, _) = setup(StubLoader::new(Behavior::Wide), ServerConfig::default());

    let response = send(&app, example_request()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "prediction": [66.0, 6.0] }));
}

#[tokio::test]
async fn api_alias_serves_predictions() {
    let (app, _, _) = setup(StubLoader::new(Behavior::Mean), ServerConfig::default());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/predict")
        .body(Body::from(json!({ "input": EXAMPLE_INPUT }).to_string()))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "prediction": 6.0 }));
}

#[tokio::test]
async fn loads_once_across_requests() {
    let (app, _, loader) = setup(StubLoader::new(Behavior::Mean), ServerConfig::default());

    for _ in 0..5 {
        assert_eq!(send(&app, example_request()).await.status(), StatusCode::OK);
    }
    assert_eq!(loader.loads(), 1);
}

#[tokio::test]
async fn repeated_predictions_are_bit_identical() {
    let (app, _, _) = setup(StubLoader::new(Behavior::Wide), ServerConfig::default());

    let input = json!({ "input": [0.1, -2.5, 3.3, 1e-7, 5.0, 6.25, -7.0, 8.0, 9.9, 10.0, 1e6] });
    let mut bodies = Vec::new();
    for _ in 0..3 {
        let response = send(&app, predict_request(input.to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        bodies.push(to_bytes(response.into_body(), usize::MAX).await.unwrap());
    }
    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_cold_requests_share_one_load() {
    let loader = StubLoader::new(Behavior::Mean).with_delay(Duration::from_millis(50));
    let (app, _, loader) = setup(loader, ServerConfig::default());

    let responses = join_all((0..16).map(|_| send(&app, example_request()))).await;
    for response in responses {
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "prediction": 6.0 }));
    }
    assert_eq!(loader.loads(), 1);
}

#[tokio::test]
async fn abandoned_request_does_not_strand_the_load() {
    let loader = StubLoader::new(Behavior::Mean).with_delay(Duration::from_millis(100));
    let (app, _, loader) = setup(loader, ServerConfig::default());

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), send(&app, example_request())).await;
    assert!(abandoned.is_err());

    let response = send(&app, example_request()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(loader.loads(), 1);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wrong_length_is_rejected_without_loading() {
    let (app, _, loader) = setup(StubLoader::new(Behavior::Mean), ServerConfig::default());

    let response = send(&app, predict_request(json!({ "input": [1, 2, 3] }).to_string())).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Input must be an array of 11 numbers" }));
    assert_eq!(loader.loads(), 0);
}

#[tokio::test]
async fn non_numeric_elements_are_rejected() {
    let (app, _, loader) = setup(StubLoader::new(Behavior::Mean), ServerConfig::default());

    for bad in [json!("5"), json!(null), json!(false), json!(1.0e39)] {
        let mut input = json!(EXAMPLE_INPUT);
        input[5] = bad;
        let response = send(&app, predict_request(json!({ "input": input }).to_string())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Input must be an array of 11 numbers" })
        );
    }
    assert_eq!(loader.loads(), 0);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let (app, _, loader) = setup(StubLoader::new(Behavior::Mean), ServerConfig::default());

    let response = send(&app, predict_request("{\"input\": [1, 2")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Invalid JSON" }));
    assert_eq!(loader.loads(), 0);
}

#[tokio::test]
async fn empty_body_is_missing_input() {
    let (app, _, loader) = setup(StubLoader::new(Behavior::Mean), ServerConfig::default());

    let response = send(&app, predict_request(Body::empty())).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Input must be an array of 11 numbers" }));
    assert_eq!(loader.loads(), 0);
}

#[tokio::test]
async fn oversized_body_gets_json_413() {
    let (app, _, loader) = setup(StubLoader::new(Behavior::Mean), ServerConfig::default());

    let padding = " ".repeat(MAX_BODY_BYTES);
    let body = format!("{{\"input\": {}, \"pad\": \"{padding}\"}}", json!(EXAMPLE_INPUT));
    let response = send(&app, predict_request(body)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(response).await, json!({ "error": "Payload Too Large" }));
    assert_eq!(loader.loads(), 0);
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    let (app, _, loader) = setup(StubLoader::new(Behavior::Mean), ServerConfig::default());

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let request = Request::builder().method(method).uri("/predict").body(Body::empty()).unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json_body(response).await, json!({ "error": "Method Not Allowed" }));
    }
    assert_eq!(loader.loads(), 0);
}

// ---------------------------------------------------------------------------
// Server-side failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_load_is_retried_on_next_request() {
    let (app, _, loader) =
        setup(StubLoader::new(Behavior::Mean).failing(1), ServerConfig::default());

    let response = send(&app, example_request()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({ "error": "Model unavailable" }));

    let response = send(&app, example_request()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "prediction": 6.0 }));
    assert_eq!(loader.loads(), 2);
}

#[tokio::test]
async fn error_detail_is_exposed_when_configured() {
    let config = ServerConfig { expose_error_detail: true, ..Default::default() };
    let (app, _, _) = setup(StubLoader::new(Behavior::Mean).failing(1), config);

    let body = json_body(send(&app, example_request()).await).await;
    assert_eq!(body["error"], "Model unavailable");
    assert!(body["detail"].as_str().unwrap().contains("/models/missing.safetensors"));
}

#[tokio::test]
async fn inference_failure_is_internal_error() {
    let (app, state, _) = setup(StubLoader::new(Behavior::Reject), ServerConfig::default());

    let response = send(&app, example_request()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({ "error": "Internal server error" }));
    assert_eq!(state.resources.live(), 0);
    assert_eq!(state.resources.total_acquired(), 1);
}

#[tokio::test]
async fn engine_panic_becomes_internal_error() {
    let (app, state, _) = setup(StubLoader::new(Behavior::Panic), ServerConfig::default());

    let response = send(&app, example_request()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({ "error": "Internal server error" }));
    assert_eq!(state.resources.live(), 0);

    // The service keeps answering afterwards.
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resources_return_to_baseline() {
    let (app, state, _) = setup(StubLoader::new(Behavior::Mean), ServerConfig::default());

    for _ in 0..4 {
        assert_eq!(send(&app, example_request()).await.status(), StatusCode::OK);
        assert_eq!(state.resources.live(), 0);
    }
    // One input tensor and one output buffer per request.
    assert_eq!(state.resources.total_acquired(), 8);

    send(&app, predict_request("[]")).await;
    assert_eq!(state.resources.total_acquired(), 8);
}

// ---------------------------------------------------------------------------
// Health and CORS
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_load_phase() {
    let (app, _, _) = setup(StubLoader::new(Behavior::Mean), ServerConfig::default());

    let health = || Request::builder().uri("/health").body(Body::empty()).unwrap();
    assert_eq!(json_body(send(&app, health()).await).await, json!({ "status": "ok", "model": "not_loaded" }));

    send(&app, example_request()).await;
    assert_eq!(json_body(send(&app, health()).await).await, json!({ "status": "ok", "model": "loaded" }));
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let (app, _, _) = setup(StubLoader::new(Behavior::Mean), ServerConfig::default());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/predict")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn cors_can_be_disabled() {
    let config = ServerConfig { cors: false, ..Default::default() };
    let (app, _, _) = setup(StubLoader::new(Behavior::Mean), config);

    let response = send(&app, example_request()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

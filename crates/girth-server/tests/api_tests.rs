//! Integration tests for the prediction API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use girth_core::{
    health::{components, HealthRegistry},
    predictor::FeatureAssembler,
    GirthError, GirthPredictor, ModelPackage, PredictorMetrics, Regressor, StructuredLogger,
};
use girth_server::api::{create_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

fn demo_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/abaca_demo_model.json")
}

/// Estimator that fails every prediction
struct FailingRegressor;

impl Regressor for FailingRegressor {
    fn predict_row(&self, _row: &[f32]) -> girth_core::Result<f64> {
        Err(GirthError::Inference("boom".to_string()))
    }

    fn n_features(&self) -> usize {
        7
    }

    fn kind(&self) -> &'static str {
        "failing"
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let predictor = GirthPredictor::load(&demo_model_path()).unwrap();
    app_with_predictor(predictor).await
}

async fn setup_failing_app() -> (Router, Arc<AppState>) {
    let package = ModelPackage::from_path(&demo_model_path()).unwrap();
    let assembler = FeatureAssembler::from_columns(&package.features).unwrap();
    let predictor =
        GirthPredictor::with_estimator(package, Box::new(FailingRegressor), assembler).unwrap();
    app_with_predictor(predictor).await
}

async fn app_with_predictor(predictor: GirthPredictor) -> (Router, Arc<AppState>) {
    let predictor = Arc::new(predictor);

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL).await;
    health_registry.register(components::PREDICTOR).await;

    let metrics = PredictorMetrics::new();
    let state = Arc::new(AppState::new(
        predictor,
        health_registry,
        metrics,
        StructuredLogger::new("test"),
    ));
    let router = create_router(state.clone());

    (router, state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_predict_with_defaults() {
    let (app, _state) = setup_test_app().await;

    let response = app.oneshot(post_json("/api/v1/predict", "{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let expected = (16.0_f64 * 36.0 * 41.0).cbrt() - 1.0;
    let girth = json["girth_cm"].as_f64().unwrap();
    assert!((girth - expected).abs() < 1e-9);
    assert_eq!(json["display"], format!("{:.2}", expected));
    assert_eq!(json["label"], "Predicted Abaca Girth (cm)");
    assert_eq!(json["model"], "abaca-girth-demo");
    assert_eq!(json["model_version"], "demo-1");
}

#[tokio::test]
async fn test_predict_is_deterministic() {
    let (app, _state) = setup_test_app().await;
    let body = r#"{"height_cm": 320.0, "leaf_count": 12, "soil_moisture": 20.0,
                   "soil_ph": 5.0, "temperature": 36.0, "humidity": 55.0, "sun_shade": 30.0}"#;

    let first = body_json(app.clone().oneshot(post_json("/api/v1/predict", body)).await.unwrap()).await;
    let second = body_json(app.oneshot(post_json("/api/v1/predict", body)).await.unwrap()).await;

    assert_eq!(first["girth_cm"], second["girth_cm"]);
    assert!(first["girth_cm"].as_f64().unwrap() >= 0.5);
}

#[tokio::test]
async fn test_predict_rejects_out_of_range() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(post_json("/api/v1/predict", r#"{"soil_ph": 11.0}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    assert_eq!(json["code"], "out_of_range");
    assert!(json["error"].as_str().unwrap().contains("soil_ph"));
}

#[tokio::test]
async fn test_predict_rejects_malformed_body() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(post_json("/api/v1/predict", r#"{"height_cm": "tall"}"#))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_predict_accepts_integral_float_leaf_count() {
    let (app, _state) = setup_test_app().await;

    // `/api/v1/features` reports the leaf count default as 5.0
    let response = app
        .oneshot(post_json("/api/v1/predict", r#"{"leaf_count": 5.0}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let expected = (16.0_f64 * 36.0 * 41.0).cbrt() - 1.0;
    assert!((json["girth_cm"].as_f64().unwrap() - expected).abs() < 1e-9);
}

#[tokio::test]
async fn test_predict_rejects_bad_leaf_count_with_error_body() {
    for body in [r#"{"leaf_count": -1}"#, r#"{"leaf_count": 4.5}"#] {
        let (app, _state) = setup_test_app().await;

        let response = app.oneshot(post_json("/api/v1/predict", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", body);

        let json = body_json(response).await;
        assert_eq!(json["code"], "invalid_input", "{}", body);
        assert!(json["error"].as_str().unwrap().contains("leaf_count"), "{}", body);
    }
}

#[tokio::test]
async fn test_malformed_json_gets_error_body() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(post_json("/api/v1/predict", "{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "invalid_input");
}

#[tokio::test]
async fn test_estimator_failure_returns_500_and_degrades_predictor() {
    let (app, _state) = setup_failing_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/predict", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["code"], "inference_failed");
    assert!(json["error"].as_str().unwrap().contains("boom"));

    let response = app.clone().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["components"][components::PREDICTOR]["status"], "degraded");
    assert_eq!(json["components"][components::MODEL]["status"], "healthy");

    let response = app.oneshot(get("/api/v1/about")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["stats"]["total_inferences"], 1);
    assert_eq!(json["stats"]["failed_inferences"], 1);
}

#[tokio::test]
async fn test_importances_sorted_ascending() {
    let (app, _state) = setup_test_app().await;

    let response = app.oneshot(get("/api/v1/importances")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["title"], "Feature Contribution to Girth Prediction");
    let features = json["features"].as_array().unwrap();
    assert_eq!(features.len(), 7);
    let scores: Vec<f64> = features.iter().map(|f| f["score"].as_f64().unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(features[6]["name"], "height_cm");
}

#[tokio::test]
async fn test_features_listing() {
    let (app, _state) = setup_test_app().await;

    let response = app.oneshot(get("/api/v1/features")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let features = json.as_array().unwrap();
    assert_eq!(features.len(), 7);
    assert_eq!(features[0]["name"], "height_cm");
    assert_eq!(features[0]["min"], 50.0);
    assert_eq!(features[0]["max"], 500.0);
}

#[tokio::test]
async fn test_about_uses_package_description() {
    let (app, _state) = setup_test_app().await;

    let response = app.oneshot(get("/api/v1/about")).await.unwrap();
    let json = body_json(response).await;
    assert!(json["description"].as_str().unwrap().contains("hand-built"));
    assert_eq!(json["model"]["estimator"], "random_forest");
    assert_eq!(json["model"]["features"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_readyz_returns_503_until_model_marked_ready() {
    let (app, state) = setup_test_app().await;

    let response = app.clone().oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["ready"], false);

    state.health_registry.set_ready(true).await;

    let response = app.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_healthz_reports_components() {
    let (app, state) = setup_test_app().await;

    let response = app.clone().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["components"].get(components::MODEL).is_some());

    state
        .health_registry
        .set_unhealthy(components::MODEL, "artifact unreadable")
        .await;
    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_exposed_after_prediction() {
    let (app, _state) = setup_test_app().await;

    app.clone()
        .oneshot(post_json("/api/v1/predict", "{}"))
        .await
        .unwrap();

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("girth_predictions_total"));
    assert!(text.contains("girth_prediction_latency_seconds"));
}

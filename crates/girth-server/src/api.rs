//! HTTP API for predictions, feature importances, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use girth_core::{
    feature_specs,
    health::{components, ComponentStatus, HealthRegistry},
    importance::{CHART_TITLE, SCORE_AXIS_LABEL},
    FeatureImportance, FeatureSpec, FeatureVector, GirthError, GirthPredictor, InferenceStats,
    ModelInfo,
    PredictorMetrics, StructuredLogger, ABOUT, PREDICTION_LABEL,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<GirthPredictor>,
    pub health_registry: HealthRegistry,
    pub metrics: PredictorMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        predictor: Arc<GirthPredictor>,
        health_registry: HealthRegistry,
        metrics: PredictorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            predictor,
            health_registry,
            metrics,
            logger,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Errors mapped onto HTTP responses with an `{error, code}` body
pub enum ApiError {
    Girth(GirthError),
    /// Request body that is not valid JSON or does not fit the schema
    InvalidBody(JsonRejection),
}

impl From<GirthError> for ApiError {
    fn from(err: GirthError) -> Self {
        Self::Girth(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Girth(err) => {
                let status = match err {
                    GirthError::OutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    GirthError::ImportancesUnavailable => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let body = ErrorResponse {
                    error: err.to_string(),
                    code: err.code().to_string(),
                };
                (status, body)
            }
            ApiError::InvalidBody(rejection) => {
                let body = ErrorResponse {
                    error: rejection.body_text(),
                    code: "invalid_input".to_string(),
                };
                (rejection.status(), body)
            }
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub label: String,
    pub girth_cm: f64,
    /// `girth_cm` rounded for display
    pub display: String,
    pub predicted_log: f64,
    pub model: String,
    pub model_version: String,
    pub generated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportancesResponse {
    pub title: String,
    pub axis_label: String,
    pub features: Vec<FeatureImportance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AboutResponse {
    pub description: String,
    pub model: ModelInfo,
    /// Predictions served since startup
    pub stats: InferenceStats,
}

/// Run one prediction. Missing fields take the form defaults.
async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FeatureVector>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(features) = match body {
        Ok(body) => body,
        Err(rejection) => {
            state.metrics.inc_rejected_inputs();
            state.logger.log_rejected_input(&rejection.body_text());
            return Err(rejection.into());
        }
    };
    if let Err(e) = features.validate() {
        state.metrics.inc_rejected_inputs();
        state.logger.log_rejected_input(&e.to_string());
        return Err(e.into());
    }

    let start = Instant::now();
    match state.predictor.predict(&features) {
        Ok(result) => {
            let elapsed = start.elapsed();
            state.metrics.observe_prediction_latency(elapsed.as_secs_f64());
            state.metrics.inc_predictions();
            state
                .logger
                .log_prediction(result.girth_cm, result.predicted_log, elapsed.as_micros());
            state.health_registry.set_healthy(components::PREDICTOR).await;

            Ok(Json(PredictResponse {
                label: PREDICTION_LABEL.to_string(),
                girth_cm: result.girth_cm,
                display: format!("{:.2}", result.girth_cm),
                predicted_log: result.predicted_log,
                model: state.predictor.info().name.clone(),
                model_version: result.model_version,
                generated_at: result.generated_at,
            }))
        }
        Err(e) => {
            state.metrics.inc_prediction_errors(e.code());
            state.logger.log_prediction_failed(e.code(), &e.to_string());
            state
                .health_registry
                .set_degraded(components::PREDICTOR, e.to_string())
                .await;
            Err(e.into())
        }
    }
}

async fn importances(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ImportancesResponse>, ApiError> {
    let features = state.predictor.importances()?;
    Ok(Json(ImportancesResponse {
        title: CHART_TITLE.to_string(),
        axis_label: SCORE_AXIS_LABEL.to_string(),
        features,
    }))
}

async fn features() -> Json<Vec<FeatureSpec>> {
    Json(feature_specs())
}

async fn about(State(state): State<Arc<AppState>>) -> Json<AboutResponse> {
    let model = state.predictor.info().clone();
    let description = model
        .description
        .clone()
        .unwrap_or_else(|| ABOUT.to_string());
    Json(AboutResponse {
        description,
        model,
        stats: state.predictor.stats(),
    })
}

/// 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/predict", post(predict))
        .route("/api/v1/importances", get(importances))
        .route("/api/v1/features", get(features))
        .route("/api/v1/about", get(about))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

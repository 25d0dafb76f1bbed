//! Observability for the girth predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, prediction/error counters, model info)
//! - Structured event logging with tracing

use crate::predictor::ModelInfo;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for inference latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PredictorMetricsInner> = OnceLock::new();

struct PredictorMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounterVec,
    rejected_inputs_total: IntCounter,
    model_info: GaugeVec,
}

impl PredictorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "girth_prediction_latency_seconds",
                "Time spent assembling features and running the model",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "girth_predictions_total",
                "Total number of girth predictions served"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter_vec!(
                "girth_prediction_errors_total",
                "Total number of failed predictions by error code",
                &["code"]
            )
            .expect("Failed to register prediction_errors_total"),

            rejected_inputs_total: register_int_counter!(
                "girth_rejected_inputs_total",
                "Prediction requests rejected for out-of-range measurements"
            )
            .expect("Failed to register rejected_inputs_total"),

            model_info: register_gauge_vec!(
                "girth_model_info",
                "Information about the loaded model package",
                &["name", "version", "estimator"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the process-wide predictor metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    /// Create a new metrics handle (registers global metrics on first call)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictorMetricsInner {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self, code: &str) {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[code])
            .inc();
    }

    pub fn inc_rejected_inputs(&self) {
        self.inner().rejected_inputs_total.inc();
    }

    pub fn set_model_info(&self, info: &ModelInfo) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[info.name.as_str(), info.version.as_str(), info.estimator.as_str()])
            .set(1.0);
    }

    pub fn predictions_total(&self) -> u64 {
        self.inner().predictions_total.get()
    }
}

/// Structured logger for predictor events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, model: &ModelInfo) {
        info!(
            event = "startup",
            service = %self.service,
            service_version = %version,
            model = %model.name,
            model_version = %model.version,
            estimator = %model.estimator,
            "Girth predictor started"
        );
    }

    pub fn log_model_loaded(&self, path: &str, model: &ModelInfo) {
        info!(
            event = "model_loaded",
            service = %self.service,
            path = %path,
            model = %model.name,
            model_version = %model.version,
            features = %model.features.join(","),
            target_transform = %model.target_transform,
            "Model package loaded"
        );
    }

    pub fn log_prediction(&self, girth_cm: f64, predicted_log: f64, latency_us: u128) {
        info!(
            event = "prediction_generated",
            service = %self.service,
            girth_cm = girth_cm,
            predicted_log = predicted_log,
            latency_us = latency_us as u64,
            "Generated girth prediction"
        );
    }

    pub fn log_prediction_failed(&self, code: &str, error: &str) {
        error!(
            event = "prediction_failed",
            service = %self.service,
            code = %code,
            error = %error,
            "Girth prediction failed"
        );
    }

    pub fn log_rejected_input(&self, error: &str) {
        warn!(
            event = "input_rejected",
            service = %self.service,
            error = %error,
            "Rejected out-of-range measurements"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "shutdown",
            service = %self.service,
            reason = %reason,
            "Girth predictor shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ModelInfo {
        ModelInfo {
            name: "abaca-girth".to_string(),
            version: "v1".to_string(),
            estimator: "random_forest".to_string(),
            target_transform: "log1p".to_string(),
            features: vec!["height_cm".to_string()],
            description: None,
        }
    }

    #[test]
    fn test_metrics_handles_share_registry() {
        let a = PredictorMetrics::new();
        let b = a.clone();
        let before = b.predictions_total();
        a.inc_predictions();
        a.observe_prediction_latency(0.0002);
        a.inc_prediction_errors("schema_mismatch");
        a.inc_rejected_inputs();
        a.set_model_info(&info());
        assert!(b.predictions_total() > before);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("girth-server");
        assert_eq!(logger.service, "girth-server");
        logger.log_model_loaded("abaca_rf_model.json", &info());
    }
}

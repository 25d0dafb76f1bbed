//! Core library for abaca girth prediction
//!
//! This crate provides:
//! - The measurement data model and its valid ranges
//! - Model package loading (native random forests and ONNX graphs)
//! - The inference adapter: assemble features, predict, invert the target transform
//! - Feature importance reporting
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod importance;
pub mod models;
pub mod observability;
pub mod package;
pub mod predictor;

/// Short description of the system, shown by the about views
pub const ABOUT: &str = "Predicts abaca (Musa textilis) plant girth from plant growth \
parameters and environmental conditions using a random forest regression model \
trained on field data, to support agricultural decision-making and research.";

/// Label shown next to a predicted girth
pub const PREDICTION_LABEL: &str = "Predicted Abaca Girth (cm)";

pub use error::{GirthError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use package::ModelPackage;
pub use predictor::{GirthPredictor, InferenceStats, ModelInfo, Regressor};

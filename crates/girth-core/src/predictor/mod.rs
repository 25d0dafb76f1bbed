//! Girth inference engine

mod features;
mod forest;
mod inference;
mod output;

pub use features::{FeatureAssembler, NUM_FEATURES};
pub use forest::{ForestSpec, RandomForestRegressor, TreeArrays};
pub use inference::{compute_checksum, OnnxRegressor};
pub use output::{OutputFormatter, TargetTransform, MIN_GIRTH_CM};

use crate::error::{GirthError, Result};
use crate::importance::rank_importances;
use crate::models::{FeatureImportance, FeatureVector, PredictionResult};
use crate::package::{EstimatorSpec, ModelPackage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// A fitted single-output regression estimator
pub trait Regressor: Send + Sync {
    /// Predict the (transformed) target for one row in model column order
    fn predict_row(&self, row: &[f32]) -> Result<f64>;

    /// Width of the rows the estimator was fitted on
    fn n_features(&self) -> usize;

    /// Short estimator name, e.g. `"random_forest"`
    fn kind(&self) -> &'static str;

    /// Per-feature importances in model column order, if the estimator has them
    fn feature_importances(&self) -> Option<Vec<f64>>;
}

/// Summary of the loaded model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub estimator: String,
    pub target_transform: String,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Inference statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub failed_inferences: u64,
}

/// Loaded model plus everything needed to turn measurements into a girth.
///
/// Immutable once built; share it behind an `Arc`.
pub struct GirthPredictor {
    info: ModelInfo,
    estimator: Box<dyn Regressor>,
    assembler: FeatureAssembler,
    formatter: OutputFormatter,
    importances: Option<Vec<FeatureImportance>>,
    inference_count: AtomicU64,
    failure_count: AtomicU64,
}

impl GirthPredictor {
    /// Load a model package from disk.
    ///
    /// Relative ONNX paths are resolved against the package's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let package = ModelPackage::from_path(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let predictor = Self::from_package(package, base_dir)?;
        info!(
            path = %path.display(),
            model = %predictor.info.name,
            version = %predictor.info.version,
            estimator = %predictor.info.estimator,
            "Model package loaded"
        );
        Ok(predictor)
    }

    pub fn from_package(package: ModelPackage, base_dir: &Path) -> Result<Self> {
        let assembler = FeatureAssembler::from_columns(&package.features)?;

        let estimator: Box<dyn Regressor> = match &package.model {
            EstimatorSpec::RandomForest(spec) => {
                Box::new(RandomForestRegressor::from_spec(spec.clone())?)
            }
            EstimatorSpec::Onnx { path, sha256 } => Box::new(OnnxRegressor::load(
                &base_dir.join(path),
                package.features.len(),
                sha256.as_deref(),
            )?),
        };

        Self::with_estimator(package, estimator, assembler)
    }

    /// Build from an already constructed estimator
    pub fn with_estimator(
        package: ModelPackage,
        estimator: Box<dyn Regressor>,
        assembler: FeatureAssembler,
    ) -> Result<Self> {
        if estimator.n_features() != assembler.columns().len() {
            return Err(GirthError::SchemaMismatch(format!(
                "estimator expects {} features but the package lists {} columns",
                estimator.n_features(),
                assembler.columns().len()
            )));
        }

        let scores = package
            .feature_importances
            .clone()
            .or_else(|| estimator.feature_importances());
        let importances = scores
            .map(|s| rank_importances(assembler.columns(), &s))
            .transpose()?;

        let info = ModelInfo {
            name: package.name.clone(),
            version: package.version_label().to_string(),
            estimator: estimator.kind().to_string(),
            target_transform: package.target_transform.as_str().to_string(),
            features: package.features.clone(),
            description: package.description.clone(),
        };

        Ok(Self {
            info,
            estimator,
            assembler,
            formatter: OutputFormatter::new(package.target_transform),
            importances,
            inference_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
        })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Feature columns in the order the model consumes them
    pub fn feature_columns(&self) -> &[String] {
        self.assembler.columns()
    }

    /// Raw estimator output for `features`, still in the transformed space
    pub fn predict_raw(&self, features: &FeatureVector) -> Result<f64> {
        let row = self.assembler.assemble(features);
        if row.len() != self.estimator.n_features() {
            return Err(GirthError::SchemaMismatch(format!(
                "assembled {} values for an estimator expecting {}",
                row.len(),
                self.estimator.n_features()
            )));
        }
        self.estimator.predict_row(&row)
    }

    /// Predict girth in centimetres, floored at [`MIN_GIRTH_CM`].
    ///
    /// Inputs are not range-checked here; see [`FeatureVector::validate`].
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult> {
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        let outcome = self.predict_raw(features).and_then(|raw| {
            if raw.is_finite() {
                Ok(raw)
            } else {
                Err(GirthError::Inference(format!("estimator returned {}", raw)))
            }
        });
        let predicted_log = match outcome {
            Ok(raw) => raw,
            Err(e) => {
                self.failure_count.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        let girth_cm = self.formatter.format(predicted_log);
        if !girth_cm.is_finite() {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
            return Err(GirthError::Inference(format!(
                "estimator output {} has no finite girth under {}",
                predicted_log,
                self.info.target_transform
            )));
        }
        debug!(predicted_log, girth_cm, "Prediction completed");

        Ok(PredictionResult {
            girth_cm,
            predicted_log,
            model_version: self.info.version.clone(),
            generated_at: chrono::Utc::now().timestamp(),
        })
    }

    /// Feature importances sorted ascending by score
    pub fn importances(&self) -> Result<Vec<FeatureImportance>> {
        self.importances
            .clone()
            .ok_or(GirthError::ImportancesUnavailable)
    }

    /// Get inference statistics
    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            failed_inferences: self.failure_count.load(Ordering::Relaxed),
        }
    }
}

//! Model package format
//!
//! A model package is a single JSON document bundling the estimator, the
//! ordered feature columns it was trained on, the target transform and
//! (optionally) precomputed feature importances:
//!
//! ```json
//! {
//!   "name": "abaca-girth-rf",
//!   "version": "2026.01",
//!   "features": ["height_cm", "leaf_count", "soil_moisture", "soil_pH",
//!                "temperature", "humidity", "sun_shade"],
//!   "target_transform": "log1p",
//!   "model": { "kind": "random_forest", "n_features": 7, "trees": [ ... ] }
//! }
//! ```
//!
//! ONNX estimators are referenced by path, resolved relative to the package:
//! `"model": { "kind": "onnx", "path": "girth.onnx", "sha256": "..." }`.

use crate::error::{GirthError, Result};
use crate::predictor::{ForestSpec, TargetTransform};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL_NAME: &str = "abaca-girth";

fn default_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

/// Estimator stored in a package
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    RandomForest(ForestSpec),
    Onnx {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sha256: Option<String>,
    },
}

impl EstimatorSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            EstimatorSpec::RandomForest(_) => "random_forest",
            EstimatorSpec::Onnx { .. } => "onnx",
        }
    }
}

/// Deserialized model package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPackage {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Feature columns in training order
    pub features: Vec<String>,
    #[serde(default)]
    pub target_transform: TargetTransform,
    /// Importance per entry of `features`; overrides anything the estimator derives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_importances: Option<Vec<f64>>,
    pub model: EstimatorSpec,
}

impl ModelPackage {
    /// Read and parse a package file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| GirthError::ModelIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let package: ModelPackage = serde_json::from_str(json)?;
        package.check()?;
        Ok(package)
    }

    /// Version string, falling back to `"unversioned"`
    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or("unversioned")
    }

    fn check(&self) -> Result<()> {
        if let Some(scores) = &self.feature_importances {
            if scores.len() != self.features.len() {
                return Err(GirthError::InvalidModel(format!(
                    "{} feature importances for {} feature columns",
                    scores.len(),
                    self.features.len()
                )));
            }
            if scores.iter().any(|s| !s.is_finite()) {
                return Err(GirthError::InvalidModel(
                    "feature importances must be finite".to_string(),
                ));
            }
        }
        if let EstimatorSpec::RandomForest(forest) = &self.model {
            if forest.n_features != self.features.len() {
                return Err(GirthError::SchemaMismatch(format!(
                    "forest was fitted on {} features but the package lists {} columns",
                    forest.n_features,
                    self.features.len()
                )));
            }
        }
        Ok(())
    }
}

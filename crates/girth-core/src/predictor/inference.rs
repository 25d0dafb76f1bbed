//! ONNX inference using tract
//!
//! Runs regression graphs exported from the training pipeline (for example
//! with skl2onnx). The graph takes a single `[1, n_features]` f32 input and
//! yields the transformed target as its first output value.

use super::Regressor;
use crate::error::{GirthError, Result};
use anyhow::Context;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, info, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based regressor
pub struct OnnxRegressor {
    model: TractModel,
    n_features: usize,
}

impl std::fmt::Debug for OnnxRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxRegressor")
            .field("n_features", &self.n_features)
            .finish_non_exhaustive()
    }
}

impl OnnxRegressor {
    /// Load an ONNX graph from disk, verifying its checksum when one is given.
    pub fn load(path: &Path, n_features: usize, sha256: Option<&str>) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| GirthError::ModelIo {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(expected) = sha256 {
            let actual = compute_checksum(&bytes);
            if !actual.eq_ignore_ascii_case(expected.trim()) {
                return Err(GirthError::ChecksumMismatch {
                    path: path.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
            info!(path = %path.display(), checksum = %actual, "ONNX checksum validated");
        }

        Self::from_bytes(&bytes, n_features)
    }

    /// Parse and optimize an ONNX graph from bytes
    pub fn from_bytes(model_bytes: &[u8], n_features: usize) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .and_then(|m| m.with_input_fact(0, f32::fact([1, n_features]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| GirthError::InvalidModel(format!("failed to prepare ONNX graph: {:#}", e)))?;
        Ok(Self { model, n_features })
    }

    fn run(&self, row: &[f32]) -> anyhow::Result<f64> {
        let input: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, self.n_features), row.to_vec())?.into();
        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let view = output.to_array_view::<f32>()?;
        let value = view.iter().next().copied().context("Model output is empty")?;
        Ok(f64::from(value))
    }
}

impl Regressor for OnnxRegressor {
    fn predict_row(&self, row: &[f32]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(GirthError::SchemaMismatch(format!(
                "ONNX graph expects {} features, got {}",
                self.n_features,
                row.len()
            )));
        }

        let start = Instant::now();
        let value = self
            .run(row)
            .map_err(|e| GirthError::Inference(format!("{:#}", e)))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }
        Ok(value)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }

    /// ONNX graphs carry no importances; the package has to supply them.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Hex-encoded SHA256 of `data`
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

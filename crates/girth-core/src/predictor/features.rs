//! Feature assembly for model inference
//!
//! Maps a [`FeatureVector`] onto the column order a model package declares.
//! The mapping is resolved once, when the package is loaded; a package whose
//! columns are not exactly the seven known measurements is rejected there
//! instead of silently mispredicting later.

use crate::error::{GirthError, Result};
use crate::models::{FeatureField, FeatureVector};
use std::collections::HashSet;

/// Number of input features every girth model consumes
pub const NUM_FEATURES: usize = FeatureField::ALL.len();

/// Resolved column layout of a loaded model
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    columns: Vec<String>,
    order: Vec<FeatureField>,
}

impl FeatureAssembler {
    /// Resolve a package's column names against the known feature set.
    pub fn from_columns(columns: &[String]) -> Result<Self> {
        let mut order = Vec::with_capacity(columns.len());
        let mut seen = HashSet::new();

        for name in columns {
            let field = FeatureField::from_column_name(name).ok_or_else(|| {
                GirthError::SchemaMismatch(format!("unknown feature column '{}'", name))
            })?;
            if !seen.insert(field) {
                return Err(GirthError::SchemaMismatch(format!(
                    "column '{}' maps to {} which is already present",
                    name, field
                )));
            }
            order.push(field);
        }

        let missing: Vec<&str> = FeatureField::ALL
            .iter()
            .filter(|f| !seen.contains(f))
            .map(|f| f.column())
            .collect();
        if !missing.is_empty() {
            return Err(GirthError::SchemaMismatch(format!(
                "model is missing feature columns: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            columns: columns.to_vec(),
            order,
        })
    }

    /// Column names exactly as the package declares them
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Build the model input row in the package's column order
    pub fn assemble(&self, features: &FeatureVector) -> Vec<f32> {
        self.order.iter().map(|f| features.get(*f) as f32).collect()
    }
}

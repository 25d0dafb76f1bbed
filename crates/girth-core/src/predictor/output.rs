//! Prediction output post-processing
//!
//! Inverts the target transform the model was trained with and applies the
//! girth floor.

use serde::{Deserialize, Serialize};

/// Smallest girth ever reported, in centimetres
pub const MIN_GIRTH_CM: f64 = 0.5;

/// Transform applied to the target at training time.
///
/// Nothing inside an estimator records this, so it is declared by the model
/// package. Packages that omit it get `log1p`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTransform {
    /// Trained on `ln(1 + girth)`
    #[default]
    Log1p,
    /// Trained on raw girth
    Identity,
}

impl TargetTransform {
    /// Map a raw model output back to centimetres
    pub fn invert(&self, raw: f64) -> f64 {
        match self {
            TargetTransform::Log1p => raw.exp_m1(),
            TargetTransform::Identity => raw,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetTransform::Log1p => "log1p",
            TargetTransform::Identity => "identity",
        }
    }
}

/// Turns raw estimator outputs into girth values
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    transform: TargetTransform,
}

impl OutputFormatter {
    pub fn new(transform: TargetTransform) -> Self {
        Self { transform }
    }

    /// `max(invert(raw), MIN_GIRTH_CM)`
    pub fn format(&self, raw: f64) -> f64 {
        self.transform.invert(raw).max(MIN_GIRTH_CM)
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(TargetTransform::default())
    }
}

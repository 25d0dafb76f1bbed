use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GirthError {
    #[error("failed to read model artifact {path}: {source}")]
    ModelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed model package: {0}")]
    PackageFormat(#[from] serde_json::Error),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("{field} = {value} is outside the valid range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("model does not provide feature importances")]
    ImportancesUnavailable,

    #[error("inference failed: {0}")]
    Inference(String),
}

impl GirthError {
    /// Stable machine-readable code for API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            GirthError::ModelIo { .. } => "model_io",
            GirthError::PackageFormat(_) => "package_format",
            GirthError::InvalidModel(_) => "invalid_model",
            GirthError::ChecksumMismatch { .. } => "checksum_mismatch",
            GirthError::SchemaMismatch(_) => "schema_mismatch",
            GirthError::OutOfRange { .. } => "out_of_range",
            GirthError::ImportancesUnavailable => "importances_unavailable",
            GirthError::Inference(_) => "inference_failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, GirthError>;

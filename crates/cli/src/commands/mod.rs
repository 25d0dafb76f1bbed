//! CLI command implementations

pub mod importances;
pub mod info;
pub mod predict;

use crate::client::ApiClient;
use crate::config::Target;
use anyhow::{Context, Result};
use girth_core::GirthPredictor;
use tracing::debug;

/// Where commands get their answers from
pub enum Backend {
    /// Model package loaded into this process
    Local(GirthPredictor),
    /// A running girth-server
    Remote(ApiClient),
}

impl Backend {
    pub fn connect(target: &Target) -> Result<Self> {
        match target {
            Target::Local(path) => {
                debug!(path = %path.display(), "Loading model package");
                let predictor = GirthPredictor::load(path).with_context(|| {
                    format!("Failed to load model package {}", path.display())
                })?;
                Ok(Backend::Local(predictor))
            }
            Target::Remote(url) => {
                debug!(url = %url, "Using remote prediction API");
                Ok(Backend::Remote(ApiClient::new(url)?))
            }
        }
    }
}

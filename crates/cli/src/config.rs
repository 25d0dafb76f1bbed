//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Model package used when nothing else is configured
pub const DEFAULT_MODEL_PATH: &str = "abaca_rf_model.json";

/// Defaults read from `~/.config/girth/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Model package for local inference
    pub model_path: Option<PathBuf>,
    /// girth-server endpoint for remote inference
    pub api_url: Option<String>,
}

impl Config {
    /// Load the user's configuration file, or defaults if there is none
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("girth").join("config.json"))
    }
}

/// Where predictions come from
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Local(PathBuf),
    Remote(String),
}

/// Command-line flags win over the config file; an explicit API URL wins
/// over any model path.
pub fn resolve_target(model: Option<PathBuf>, api_url: Option<String>, config: &Config) -> Target {
    if let Some(url) = api_url {
        return Target::Remote(url);
    }
    if let Some(path) = model {
        return Target::Local(path);
    }
    if let Some(url) = &config.api_url {
        return Target::Remote(url.clone());
    }
    Target::Local(
        config
            .model_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
    )
}

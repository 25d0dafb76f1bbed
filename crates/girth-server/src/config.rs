//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration, read from `GIRTH_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Path to the JSON model package
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Address to bind the HTTP listener to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port for the prediction API, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("abaca_rf_model.json")
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            bind_address: default_bind_address(),
            api_port: default_api_port(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("GIRTH"))
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("GIRTH").source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_source(env(&[])).unwrap();
        assert_eq!(config.model_path, PathBuf::from("abaca_rf_model.json"));
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_environment_overrides() {
        let config = ServerConfig::from_source(env(&[
            ("GIRTH_MODEL_PATH", "/srv/models/girth.json"),
            ("GIRTH_API_PORT", "9090"),
            ("GIRTH_BIND_ADDRESS", "127.0.0.1"),
        ]))
        .unwrap();
        assert_eq!(config.model_path, PathBuf::from("/srv/models/girth.json"));
        assert_eq!(config.listen_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(ServerConfig::from_source(env(&[("GIRTH_API_PORT", "not-a-port")])).is_err());
    }
}

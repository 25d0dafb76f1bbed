//! Girth Server - abaca girth prediction service
//!
//! Loads the model package once at startup and serves predictions until
//! interrupted. A missing or invalid package is fatal.

use anyhow::{Context, Result};
use girth_core::{
    health::{components, HealthRegistry},
    GirthPredictor, PredictorMetrics, StructuredLogger,
};
use girth_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_NAME: &str = "girth-server";
const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting girth-server");

    let config = ServerConfig::load()?;
    info!(model_path = %config.model_path.display(), addr = %config.listen_addr(), "Server configured");

    let logger = StructuredLogger::new(SERVICE_NAME);
    let health_registry = HealthRegistry::new();

    let predictor = match GirthPredictor::load(&config.model_path) {
        Ok(predictor) => Arc::new(predictor),
        Err(e) => {
            error!(path = %config.model_path.display(), error = %e, "Failed to load model package");
            return Err(e).with_context(|| {
                format!("Failed to load model package {}", config.model_path.display())
            });
        }
    };
    logger.log_model_loaded(&config.model_path.display().to_string(), predictor.info());

    health_registry.register(components::MODEL).await;
    health_registry.register(components::PREDICTOR).await;

    let metrics = PredictorMetrics::new();
    metrics.set_model_info(predictor.info());

    logger.log_startup(SERVICE_VERSION, predictor.info());

    let app_state = Arc::new(api::AppState::new(
        predictor,
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    // Model is loaded; accept traffic
    health_registry.set_ready(true).await;

    let addr = config.listen_addr();
    let api_handle = tokio::spawn(async move { api::serve(&addr, app_state).await });

    tokio::select! {
        result = api_handle => {
            result.context("API server task panicked")??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }
    info!("Shutting down");

    Ok(())
}

//! Girth prediction command

use anyhow::Result;
use colored::Colorize;
use girth_core::{FeatureVector, PREDICTION_LABEL};
use serde::Serialize;

use super::Backend;
use crate::client::PredictResponse;
use crate::output::{format_girth, print_json, print_success, OutputFormat};

#[derive(Serialize)]
struct PredictionOutput<'a> {
    inputs: &'a FeatureVector,
    #[serde(flatten)]
    prediction: PredictResponse,
}

/// Predict girth for one set of measurements
pub async fn predict(backend: &Backend, features: FeatureVector, format: OutputFormat) -> Result<()> {
    features.validate()?;

    let prediction = match backend {
        Backend::Local(predictor) => {
            let result = predictor.predict(&features)?;
            PredictResponse {
                label: PREDICTION_LABEL.to_string(),
                girth_cm: result.girth_cm,
                display: format!("{:.2}", result.girth_cm),
                predicted_log: result.predicted_log,
                model: predictor.info().name.clone(),
                model_version: result.model_version,
                generated_at: result.generated_at,
            }
        }
        Backend::Remote(client) => client.predict(&features).await?,
    };

    match format {
        OutputFormat::Json => print_json(&PredictionOutput {
            inputs: &features,
            prediction,
        })?,
        OutputFormat::Table => {
            println!("{}", "Abaca Girth Prediction".bold());
            println!("{}", "=".repeat(40));
            println!("Plant Height:      {} cm", features.height_cm);
            println!("Leaf Count:        {}", features.leaf_count);
            println!("Soil Moisture:     {} %", features.soil_moisture);
            println!("Soil pH:           {}", features.soil_ph);
            println!("Temperature:       {} °C", features.temperature);
            println!("Humidity:          {} %", features.humidity);
            println!("Sun Shade:         {} %", features.sun_shade);
            println!();
            print_success(&format!(
                "{}: {}",
                prediction.label,
                format_girth(prediction.girth_cm).green().bold()
            ));
            println!(
                "Model: {} ({})",
                prediction.model.cyan(),
                prediction.model_version
            );
            if let Some(at) = chrono::DateTime::from_timestamp(prediction.generated_at, 0) {
                println!("Generated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
    }

    Ok(())
}

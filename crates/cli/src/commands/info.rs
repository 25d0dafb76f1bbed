//! Input listing and about commands

use anyhow::Result;
use colored::Colorize;
use girth_core::{feature_specs, ABOUT};
use tabled::Tabled;

use super::Backend;
use crate::client::AboutResponse;
use crate::output::{format_range, print_info, print_json, OutputFormat};

/// Row for the inputs table
#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "Column")]
    name: String,
    #[tabled(rename = "Input")]
    label: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Default")]
    default: String,
}

/// List the seven model inputs with their valid ranges and defaults
pub fn show_features(format: OutputFormat) -> Result<()> {
    let specs = feature_specs();

    match format {
        OutputFormat::Json => print_json(&specs)?,
        OutputFormat::Table => {
            let rows: Vec<FeatureRow> = specs
                .into_iter()
                .map(|s| FeatureRow {
                    range: format_range(s.min, s.max, s.integer),
                    default: s.default.to_string(),
                    name: s.name,
                    label: s.label,
                    unit: s.unit,
                })
                .collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}

/// Describe the system and the loaded model
pub async fn show_about(backend: &Backend, format: OutputFormat) -> Result<()> {
    let about = match backend {
        Backend::Local(predictor) => {
            let model = predictor.info().clone();
            AboutResponse {
                description: model.description.clone().unwrap_or_else(|| ABOUT.to_string()),
                model,
                stats: None,
            }
        }
        Backend::Remote(client) => client.about().await?,
    };

    match format {
        OutputFormat::Json => print_json(&about)?,
        OutputFormat::Table => {
            println!("{}", "About the System".bold());
            println!("{}", "=".repeat(50));
            println!("{}", about.description);
            println!();
            println!("Model:             {}", about.model.name.cyan());
            println!("Version:           {}", about.model.version);
            println!("Estimator:         {}", about.model.estimator);
            println!("Target transform:  {}", about.model.target_transform);
            print_info(&format!("Feature columns: {}", about.model.features.join(", ")));
            if let Some(stats) = &about.stats {
                println!(
                    "Predictions:       {} served, {} failed",
                    stats.total_inferences, stats.failed_inferences
                );
            }
        }
    }

    Ok(())
}

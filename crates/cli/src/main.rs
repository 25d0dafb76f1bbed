//! Abaca Girth Prediction CLI
//!
//! Predicts abaca girth from plant and environmental measurements, either
//! with a local model package or against a running girth-server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{importances, info, predict, Backend};
use girth_core::{check_range, FeatureField, FeatureVector};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Abaca Girth Prediction System
#[derive(Parser)]
#[command(name = "girth")]
#[command(author, version, about = "CLI for the Abaca Girth Prediction System", long_about = None)]
pub struct Cli {
    /// Model package for local inference (can also be set via GIRTH_MODEL env var)
    #[arg(long, env = "GIRTH_MODEL", global = true)]
    pub model: Option<PathBuf>,

    /// girth-server URL; takes precedence over --model (can also be set via GIRTH_API_URL)
    #[arg(long, env = "GIRTH_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict abaca girth from measurements; omitted values use the defaults
    Predict(MeasurementArgs),

    /// Show feature importances as a bar chart
    Importances {
        /// Length of the longest bar
        #[arg(long, default_value_t = 40)]
        width: usize,
    },

    /// List the model inputs with their ranges and defaults
    Features,

    /// Describe the system and the loaded model
    About,
}

/// Measurement flags, each range-checked while parsing
#[derive(clap::Args, Debug)]
pub struct MeasurementArgs {
    /// Plant height in cm [50, 500]
    #[arg(long, value_parser = measurement(FeatureField::HeightCm))]
    pub height_cm: Option<f64>,

    /// Number of leaves [1, 20]
    #[arg(long, value_parser = leaf_count)]
    pub leaf_count: Option<u32>,

    /// Soil moisture in % [0, 100]
    #[arg(long, value_parser = measurement(FeatureField::SoilMoisture))]
    pub soil_moisture: Option<f64>,

    /// Soil pH [3, 9]
    #[arg(long, value_parser = measurement(FeatureField::SoilPh))]
    pub soil_ph: Option<f64>,

    /// Temperature in °C [10, 45]
    #[arg(long, value_parser = measurement(FeatureField::Temperature))]
    pub temperature: Option<f64>,

    /// Relative humidity in % [0, 100]
    #[arg(long, value_parser = measurement(FeatureField::Humidity))]
    pub humidity: Option<f64>,

    /// Sun shade in % [0, 100]
    #[arg(long, value_parser = measurement(FeatureField::SunShade))]
    pub sun_shade: Option<f64>,
}

impl MeasurementArgs {
    fn into_features(self) -> FeatureVector {
        let defaults = FeatureVector::default();
        FeatureVector {
            height_cm: self.height_cm.unwrap_or(defaults.height_cm),
            leaf_count: self.leaf_count.unwrap_or(defaults.leaf_count),
            soil_moisture: self.soil_moisture.unwrap_or(defaults.soil_moisture),
            soil_ph: self.soil_ph.unwrap_or(defaults.soil_ph),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            humidity: self.humidity.unwrap_or(defaults.humidity),
            sun_shade: self.sun_shade.unwrap_or(defaults.sun_shade),
        }
    }
}

/// Value parser accepting only numbers inside `field`'s valid range
fn measurement(
    field: FeatureField,
) -> impl Fn(&str) -> std::result::Result<f64, String> + Clone + Send + Sync + 'static {
    move |s: &str| {
        let value: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
        check_range(field, value).map_err(|e| e.to_string())?;
        Ok(value)
    }
}

fn leaf_count(s: &str) -> std::result::Result<u32, String> {
    let value: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a whole number", s))?;
    check_range(FeatureField::LeafCount, f64::from(value)).map_err(|e| e.to_string())?;
    Ok(value)
}

fn init_tracing(verbose: bool) {
    if !verbose {
        return;
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn connect(model: Option<PathBuf>, api_url: Option<String>) -> Result<Backend> {
    let config = config::Config::load()?;
    let target = config::resolve_target(model, api_url, &config);
    Backend::connect(&target)
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Features => info::show_features(cli.format),
        Commands::Predict(args) => {
            let backend = connect(cli.model, cli.api_url)?;
            predict::predict(&backend, args.into_features(), cli.format).await
        }
        Commands::Importances { width } => {
            let backend = connect(cli.model, cli.api_url)?;
            importances::show_importances(&backend, width, cli.format).await
        }
        Commands::About => {
            let backend = connect(cli.model, cli.api_url)?;
            info::show_about(&backend, cli.format).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

//! Feature importance command

use anyhow::Result;
use girth_core::importance::{render_bar_chart, CHART_TITLE, SCORE_AXIS_LABEL};

use super::Backend;
use crate::client::ImportancesResponse;
use crate::output::{color_chart, print_json, OutputFormat};

/// Show the model's feature importances as a horizontal bar chart
pub async fn show_importances(backend: &Backend, width: usize, format: OutputFormat) -> Result<()> {
    let response = match backend {
        Backend::Local(predictor) => ImportancesResponse {
            title: CHART_TITLE.to_string(),
            axis_label: SCORE_AXIS_LABEL.to_string(),
            features: predictor.importances()?,
        },
        Backend::Remote(client) => client.importances().await?,
    };

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            println!("{}", color_chart(&render_bar_chart(&response.features, width)));
        }
    }

    Ok(())
}

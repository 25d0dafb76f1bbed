//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human readable (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Pretty-print any serializable value as JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Girth with two decimals and its unit
pub fn format_girth(girth_cm: f64) -> String {
    format!("{:.2} cm", girth_cm)
}

/// Range of an input, integers shown without decimals
pub fn format_range(min: f64, max: f64, integer: bool) -> String {
    if integer {
        format!("{:.0} – {:.0}", min, max)
    } else {
        format!("{} – {}", min, max)
    }
}

/// Colour the bars of a rendered importance chart
pub fn color_chart(chart: &str) -> String {
    chart
        .lines()
        .map(|line| match line.find('█') {
            Some(start) => {
                let end = line.rfind('█').map(|i| i + '█'.len_utf8()).unwrap_or(start);
                format!(
                    "{}{}{}",
                    &line[..start],
                    line[start..end].bright_green(),
                    &line[end..]
                )
            }
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

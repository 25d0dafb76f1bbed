//! Feature importance reporting
//!
//! Pairs importance scores with their feature columns and orders them for a
//! horizontal bar chart, least important first.

use crate::error::{GirthError, Result};
use crate::models::FeatureImportance;
use std::collections::HashSet;

/// Chart title used by every renderer
pub const CHART_TITLE: &str = "Feature Contribution to Girth Prediction";

/// Axis label for the score dimension
pub const SCORE_AXIS_LABEL: &str = "Importance Score";

/// Pair `scores` with `columns` and sort ascending by score.
///
/// Ties keep column order.
pub fn rank_importances(columns: &[String], scores: &[f64]) -> Result<Vec<FeatureImportance>> {
    if columns.len() != scores.len() {
        return Err(GirthError::InvalidModel(format!(
            "{} importance scores for {} feature columns",
            scores.len(),
            columns.len()
        )));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
        return Err(GirthError::SchemaMismatch(format!(
            "duplicate feature column '{}'",
            dup
        )));
    }

    let mut ranked: Vec<FeatureImportance> = columns
        .iter()
        .zip(scores)
        .map(|(name, &score)| FeatureImportance {
            name: name.clone(),
            score,
        })
        .collect();
    ranked.sort_by(|a, b| a.score.total_cmp(&b.score));
    Ok(ranked)
}

/// Render a ranked list as a text bar chart, most important on top.
///
/// `width` is the length of the longest bar in characters.
pub fn render_bar_chart(ranked: &[FeatureImportance], width: usize) -> String {
    let label_width = ranked.iter().map(|f| f.name.len()).max().unwrap_or(0);
    let max_score = ranked
        .iter()
        .map(|f| f.score)
        .fold(0.0_f64, f64::max);

    let mut out = String::new();
    out.push_str(CHART_TITLE);
    out.push('\n');
    for feature in ranked.iter().rev() {
        let bar_len = if max_score > 0.0 {
            ((feature.score.max(0.0) / max_score) * width as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{:>label_width$} | {} {:.4}\n",
            feature.name,
            "█".repeat(bar_len),
            feature.score,
            label_width = label_width
        ));
    }
    out.push_str(&format!("{:>label_width$}   {}\n", "", SCORE_AXIS_LABEL, label_width = label_width));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sorted_ascending() {
        let ranked = rank_importances(
            &columns(&["height_cm", "leaf_count", "soil_ph"]),
            &[0.6, 0.1, 0.3],
        )
        .unwrap();
        let names: Vec<&str> = ranked.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["leaf_count", "soil_ph", "height_cm"]);
        assert!(ranked.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn test_ties_keep_column_order() {
        let ranked = rank_importances(&columns(&["a", "b", "c"]), &[0.2, 0.2, 0.1]).unwrap();
        let names: Vec<&str> = ranked.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(rank_importances(&columns(&["a", "b"]), &[1.0]).is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = rank_importances(&columns(&["a", "a"]), &[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, GirthError::SchemaMismatch(_)));
    }

    #[test]
    fn test_bar_chart_most_important_first() {
        let ranked =
            rank_importances(&columns(&["humidity", "height_cm"]), &[0.25, 0.75]).unwrap();
        let chart = render_bar_chart(&ranked, 8);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], CHART_TITLE);
        assert!(lines[1].trim_start().starts_with("height_cm"));
        assert_eq!(lines[1].matches('█').count(), 8);
        assert_eq!(lines[2].matches('█').count(), 3);
        assert!(lines[3].contains(SCORE_AXIS_LABEL));
    }
}

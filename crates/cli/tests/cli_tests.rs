//! CLI integration tests

use std::process::{Command, Output};

fn demo_model() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures/abaca_demo_model.json").to_string()
}

/// Run the `girth` binary isolated from the user's config and environment
fn girth(args: &[&str]) -> Output {
    let home = tempfile::tempdir().expect("Failed to create temp home");
    Command::new(env!("CARGO_BIN_EXE_girth"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("GIRTH_MODEL")
        .env_remove("GIRTH_API_URL")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute command")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("stdout should be JSON")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = girth(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Abaca Girth"), "Should show app name");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("importances"), "Should show importances command");
    assert!(stdout.contains("features"), "Should show features command");
    assert!(stdout.contains("about"), "Should show about command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = girth(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("girth"), "Should show binary name");
}

#[test]
fn test_predict_help_lists_measurements() {
    let output = girth(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for flag in [
        "--height-cm",
        "--leaf-count",
        "--soil-moisture",
        "--soil-ph",
        "--temperature",
        "--humidity",
        "--sun-shade",
    ] {
        assert!(stdout.contains(flag), "Should show {}", flag);
    }
}

/// The inputs listing needs no model
#[test]
fn test_features_json_without_model() {
    let output = girth(&["features", "--format", "json"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    let features = json.as_array().unwrap();
    assert_eq!(features.len(), 7);
    assert_eq!(features[1]["name"], "leaf_count");
    assert_eq!(features[1]["default"], 5.0);
}

#[test]
fn test_predict_with_local_model() {
    let model = demo_model();
    let output = girth(&["predict", "--model", &model, "--format", "json"]);
    assert!(
        output.status.success(),
        "predict failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json = stdout_json(&output);
    let expected = (16.0_f64 * 36.0 * 41.0).cbrt() - 1.0;
    assert!((json["girth_cm"].as_f64().unwrap() - expected).abs() < 1e-9);
    assert_eq!(json["display"], format!("{:.2}", expected));
    assert_eq!(json["inputs"]["leaf_count"], 5);
    assert_eq!(json["model_version"], "demo-1");
}

#[test]
fn test_predict_table_output() {
    let model = demo_model();
    let output = girth(&["predict", "--model", &model, "--height-cm", "320"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Predicted Abaca Girth (cm)"));
    assert!(stdout.contains(" cm"));
}

#[test]
fn test_predict_rejects_out_of_range_flag() {
    let model = demo_model();
    let output = girth(&["predict", "--model", &model, "--soil-ph", "11"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("soil"), "{}", stderr);
}

#[test]
fn test_importances_json_ascending() {
    let model = demo_model();
    let output = girth(&["importances", "--model", &model, "--format", "json"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["title"], "Feature Contribution to Girth Prediction");
    let features = json["features"].as_array().unwrap();
    let scores: Vec<f64> = features.iter().map(|f| f["score"].as_f64().unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(features.last().unwrap()["name"], "height_cm");
}

#[test]
fn test_importances_chart_most_important_first() {
    let model = demo_model();
    let output = girth(&["importances", "--model", &model, "--width", "20"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "Feature Contribution to Girth Prediction");
    assert!(lines[1].contains("height_cm"));
    assert!(stdout.contains("Importance Score"));
}

#[test]
fn test_missing_model_fails() {
    let output = girth(&["predict", "--model", "/nonexistent/abaca_rf_model.json"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("abaca_rf_model.json"), "{}", stderr);
}

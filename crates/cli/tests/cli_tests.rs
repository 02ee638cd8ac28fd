//! CLI integration tests

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const HEADER: &str = "prom_tareas_t1,prom_examenes_t1,prom_part_t1,asistencia_t1,\
prom_tareas_t2,prom_examenes_t2,prom_part_t2,asistencia_t2,nota_final_t3";

fn gp(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gp"))
        .args(args)
        .env_remove("GP_API_URL")
        .env_remove("GP_DATASET")
        .env_remove("GP_MODEL_PATH")
        .output()
        .expect("Failed to execute gp")
}

fn write_dataset(path: &Path, rows: usize) {
    let mut text = HEADER.to_string();
    for i in 0..rows {
        let features: Vec<f64> = (0..8)
            .map(|j| 45.0 + ((i * (5 + 2 * j) + 13 * j) % 55) as f64)
            .collect();
        let target = features.iter().sum::<f64>() / 8.0;
        let cells: Vec<String> = features
            .iter()
            .chain(std::iter::once(&target))
            .map(|v| format!("{:.1}", v))
            .collect();
        text.push('\n');
        text.push_str(&cells.join(","));
    }
    std::fs::write(path, text).unwrap();
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = gp(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Grade Predictor"), "Should show app name");
    assert!(stdout.contains("train"), "Should show train command");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("model"), "Should show model command");
    assert!(stdout.contains("health"), "Should show health command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = gp(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("gp"), "Should show binary name");
}

#[test]
fn test_predict_help_lists_indicators() {
    let output = gp(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for flag in [
        "--tareas-t1",
        "--examenes-t1",
        "--part-t1",
        "--asistencia-t1",
        "--tareas-t2",
        "--examenes-t2",
        "--part-t2",
        "--asistencia-t2",
    ] {
        assert!(stdout.contains(flag), "Should list {}", flag);
    }
}

#[test]
fn test_predict_rejects_out_of_range_before_sending() {
    // Nothing listens on port 9; a range error must be reported first
    let output = gp(&[
        "--api-url",
        "http://127.0.0.1:9",
        "predict",
        "--tareas-t1",
        "85",
        "--examenes-t1",
        "150",
        "--part-t1",
        "92",
        "--asistencia-t1",
        "95",
        "--tareas-t2",
        "87",
        "--examenes-t2",
        "82",
        "--part-t2",
        "88",
        "--asistencia-t2",
        "93",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("prom_examenes_t1"), "stderr: {}", stderr);
}

#[test]
fn test_local_train_writes_model() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("notas.csv");
    let model = dir.path().join("models").join("modelo.json");
    write_dataset(&dataset, 50);

    let output = gp(&[
        "--format",
        "json",
        "train",
        "--dataset",
        dataset.to_str().unwrap(),
        "--model",
        model.to_str().unwrap(),
        "--n-estimators",
        "5",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(model.exists());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["message"], "Model trained successfully");
    assert_eq!(report["n_estimators"], 5);
    assert_eq!(report["train_rows"], 40);
    assert_eq!(report["test_rows"], 10);

    // A second run without --force reuses the saved model
    let output = gp(&[
        "--format",
        "json",
        "train",
        "--dataset",
        dataset.to_str().unwrap(),
        "--model",
        model.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["message"], "Model already exists and was loaded");
}

#[test]
fn test_local_train_missing_dataset_fails() {
    let dir = TempDir::new().unwrap();
    let output = gp(&[
        "train",
        "--dataset",
        dir.path().join("absent.csv").to_str().unwrap(),
        "--model",
        dir.path().join("modelo.json").to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dataset not found"), "stderr: {}", stderr);
}

#[test]
fn test_health_unreachable_service_fails() {
    let output = gp(&["--api-url", "http://127.0.0.1:9", "health"]);
    assert!(!output.status.success());
}

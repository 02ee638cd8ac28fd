//! Model management commands against a running service

use anyhow::Result;
use predictor_lib::{ModelInfo, TrainingReport};

use crate::client::{ApiClient, TrainRequest};
use crate::output::{
    color_flag, format_optional, print_info, print_json, print_rows, print_success,
    print_warning, OutputFormat, PropertyRow,
};

/// Show metadata about the loaded model
pub async fn show_info(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info: ModelInfo = client.get("api/v1/modelo/info").await?;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => match &info.details {
            None => print_warning(info.message.as_deref().unwrap_or("Model not loaded")),
            Some(details) => {
                print_rows(vec![
                    PropertyRow::new("Loaded", color_flag(info.loaded)),
                    PropertyRow::new("Trees", details.n_estimators),
                    PropertyRow::new("Max depth", details.max_depth),
                    PropertyRow::new("Min samples split", details.min_samples_split),
                    PropertyRow::new("Min samples leaf", details.min_samples_leaf),
                    PropertyRow::new("Features", details.feature_names.join(", ")),
                    PropertyRow::new("Path", &details.model_path),
                    PropertyRow::new(
                        "Trained at",
                        details.trained_at.format("%Y-%m-%d %H:%M"),
                    ),
                ]);
            }
        },
    }

    Ok(())
}

/// Ask the service to train, or to load its saved model unless forced
pub async fn train_remote(client: &ApiClient, force: bool, format: OutputFormat) -> Result<()> {
    let report: TrainingReport = client
        .post("api/v1/modelo/entrenar", &TrainRequest { force })
        .await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            print_report(&report);
            if let Some(warning) = &report.warning {
                print_warning(warning);
            }
        }
    }

    Ok(())
}

/// Render a training report for humans
pub fn print_report(report: &TrainingReport) {
    if !report.is_fresh() {
        print_info(&report.message);
        return;
    }

    print_success(&report.message);
    print_rows(vec![
        PropertyRow::new("MSE", format_optional(report.mse)),
        PropertyRow::new("R²", format_optional(report.r2)),
        PropertyRow::new(
            "Trees",
            report.n_estimators.map(|n| n.to_string()).unwrap_or_default(),
        ),
        PropertyRow::new(
            "Train rows",
            report.train_rows.map(|n| n.to_string()).unwrap_or_default(),
        ),
        PropertyRow::new(
            "Test rows",
            report.test_rows.map(|n| n.to_string()).unwrap_or_default(),
        ),
        PropertyRow::new("Persisted", color_flag(report.persisted)),
    ]);
}

//! Service health command

use anyhow::Result;
use predictor_lib::HealthReport;

use crate::client::ApiClient;
use crate::output::{color_flag, color_status, print_json, print_rows, OutputFormat, PropertyRow};

/// Show service health
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let report: HealthReport = client.get("api/v1/health").await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            print_rows(vec![
                PropertyRow::new("Status", color_status(report.status.as_str())),
                PropertyRow::new("Version", &report.version),
                PropertyRow::new("Model loaded", color_flag(report.model.loaded)),
                PropertyRow::new("Model kind", &report.model.kind),
                PropertyRow::new("Dataset present", color_flag(report.dataset.exists)),
                PropertyRow::new("Dataset rows", report.dataset.rows),
                PropertyRow::new("Checked at", report.timestamp.format("%Y-%m-%d %H:%M:%S")),
            ]);
        }
    }

    Ok(())
}

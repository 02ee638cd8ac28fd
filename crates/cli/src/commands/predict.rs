//! Prediction command

use anyhow::{Context, Result};
use colored::Colorize;
use predictor_lib::{PredictionResult, StudentRecord};

use crate::client::ApiClient;
use crate::output::{
    color_confidence, color_tier, format_score, print_json, print_rows, OutputFormat,
    PropertyRow,
};

/// Request a prediction for one student.
///
/// The record is validated locally so range errors never reach the network.
pub async fn predict(client: &ApiClient, values: [f64; 8], format: OutputFormat) -> Result<()> {
    let record = StudentRecord::from_values(values).context("Invalid student indicators")?;
    let result: PredictionResult = client.post("api/v1/predecir", &record).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", result.message.bold());
            println!();
            print_rows(vec![
                PropertyRow::new("Score", format_score(result.score)),
                PropertyRow::new("Tier", color_tier(result.tier)),
                PropertyRow::new("Confidence", color_confidence(result.confidence_level)),
                PropertyRow::new("Spread", format_score(result.spread)),
            ]);
        }
    }

    Ok(())
}

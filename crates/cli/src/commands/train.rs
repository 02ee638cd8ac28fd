//! Local training without a running service

use anyhow::{Context, Result};
use predictor_lib::predictor::{ForestParams, ResponseClassifier};
use predictor_lib::training::{TrainingConfig, TrainingPipeline};
use predictor_lib::{ModelService, ModelStore, TrainingReport};
use std::path::PathBuf;
use tracing::debug;

use crate::output::{print_json, print_success, print_warning, OutputFormat};

use super::model::print_report;

/// Settings for a local training run
#[derive(Debug, Clone)]
pub struct LocalTraining {
    pub dataset: PathBuf,
    pub model: PathBuf,
    pub n_estimators: usize,
    pub force: bool,
}

impl LocalTraining {
    fn service(&self) -> ModelService {
        let mut config = TrainingConfig::new(&self.dataset);
        config.forest = ForestParams {
            n_estimators: self.n_estimators,
            ..ForestParams::default()
        };

        ModelService::new(
            ModelStore::new(&self.model),
            TrainingPipeline::new(config),
            ResponseClassifier::new(),
        )
    }
}

/// Train a model from a CSV dataset and save it next to the service
pub async fn train_local(settings: LocalTraining, format: OutputFormat) -> Result<()> {
    debug!(
        dataset = %settings.dataset.display(),
        model = %settings.model.display(),
        n_estimators = settings.n_estimators,
        force = settings.force,
        "Starting local training"
    );

    let model_path = settings.model.clone();
    let report: TrainingReport = tokio::task::spawn_blocking(move || {
        let service = settings.service();
        service.train(settings.force)
    })
    .await
    .context("Training task panicked")?
    .context("Training failed")?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            print_report(&report);
            if report.persisted {
                print_success(&format!("Model saved to {}", model_path.display()));
            } else if let Some(warning) = &report.warning {
                print_warning(warning);
            }
        }
    }

    Ok(())
}

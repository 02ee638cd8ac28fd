//! Dataset to fitted model

use super::dataset::{train_test_split, Dataset};
use super::metrics::{mean_squared_error, r2_score};
use crate::error::TrainingError;
use crate::models::{TrainingReport, FEATURE_COLUMNS};
use crate::predictor::{ForestParams, RandomForest};
use crate::store::TrainedModel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Default fraction of rows held out for evaluation
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Default seed for the train/test shuffle
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Train/test split settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_size: f64,
    pub random_state: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: DEFAULT_TEST_SIZE,
            random_state: DEFAULT_SPLIT_SEED,
        }
    }
}

/// Everything needed to produce a model from a dataset
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub dataset_path: PathBuf,
    pub forest: ForestParams,
    pub split: SplitConfig,
}

impl TrainingConfig {
    pub fn new(dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            forest: ForestParams::default(),
            split: SplitConfig::default(),
        }
    }
}

/// A freshly fitted model and how it scored on held-out rows
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub mse: f64,
    pub r2: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub duration_secs: f64,
}

impl TrainingOutcome {
    /// Caller-facing report; `warning` is set when the model was not persisted
    pub fn report(&self, persist_warning: Option<String>) -> TrainingReport {
        TrainingReport {
            message: "Model trained successfully".to_string(),
            mse: Some(self.mse),
            r2: Some(self.r2),
            n_estimators: Some(self.model.forest().n_estimators()),
            train_rows: Some(self.train_rows),
            test_rows: Some(self.test_rows),
            loaded: true,
            persisted: persist_warning.is_none(),
            warning: persist_warning,
        }
    }
}

/// Loads, cleans, splits, fits and evaluates
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit a new model from the configured dataset
    pub fn run(&self) -> Result<TrainingOutcome, TrainingError> {
        let start = Instant::now();
        let dataset = Dataset::load(&self.config.dataset_path)?;
        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        self.fit(&dataset, start)
    }

    /// Fit a new model from an already loaded dataset
    pub fn run_on(&self, dataset: &Dataset) -> Result<TrainingOutcome, TrainingError> {
        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        self.fit(dataset, Instant::now())
    }

    fn fit(&self, dataset: &Dataset, start: Instant) -> Result<TrainingOutcome, TrainingError> {
        let split = train_test_split(
            dataset,
            self.config.split.test_size,
            self.config.split.random_state,
        )?;
        debug!(
            train_rows = split.train_y.len(),
            test_rows = split.test_y.len(),
            dropped_rows = dataset.total_rows() - dataset.len(),
            "Dataset split"
        );

        let forest = RandomForest::fit(self.config.forest, &split.train_x, &split.train_y)?;
        let predictions = forest.predict_batch(&split.test_x);
        let mse = mean_squared_error(&split.test_y, &predictions);
        let r2 = r2_score(&split.test_y, &predictions);

        let duration_secs = start.elapsed().as_secs_f64();
        info!(
            n_estimators = forest.n_estimators(),
            mse = mse,
            r2 = r2,
            duration_ms = (duration_secs * 1000.0) as u64,
            "Forest fitted"
        );

        let feature_names = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        Ok(TrainingOutcome {
            model: TrainedModel::new(forest, feature_names),
            mse,
            r2,
            train_rows: split.train_y.len(),
            test_rows: split.test_y.len(),
            duration_secs,
        })
    }
}

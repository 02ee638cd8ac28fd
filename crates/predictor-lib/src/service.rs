//! Model lifecycle: load, predict, retrain and describe
//!
//! The loaded model is held as an `Arc` snapshot behind a `RwLock`.
//! Predictions clone the snapshot and run without holding the lock;
//! retraining fits outside any lock and swaps the snapshot in one short
//! write, so a reader sees either the old model or the new one.
//! Concurrent retrains are serialised by a separate mutex.

use crate::error::{InferenceError, StoreError, TrainingError};
use crate::models::{DatasetStatus, ModelInfo, PredictionResult, StudentRecord, TrainingReport};
use crate::observability::{outcome, ServiceMetrics, StructuredLogger};
use crate::predictor::{InferenceEngine, ResponseClassifier};
use crate::store::{ModelStore, TrainedModel};
use crate::training::{dataset_status, TrainingPipeline};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, warn};

/// Owns the trained model and everything needed to replace it
pub struct ModelService {
    store: ModelStore,
    pipeline: TrainingPipeline,
    engine: InferenceEngine,
    model: RwLock<Option<Arc<TrainedModel>>>,
    training: Mutex<()>,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
}

impl ModelService {
    pub fn new(store: ModelStore, pipeline: TrainingPipeline, classifier: ResponseClassifier) -> Self {
        Self {
            store,
            pipeline,
            engine: InferenceEngine::new(classifier),
            model: RwLock::new(None),
            training: Mutex::new(()),
            metrics: ServiceMetrics::new(),
            logger: StructuredLogger::new("grade-predictor"),
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn pipeline(&self) -> &TrainingPipeline {
        &self.pipeline
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Load the persisted model, if any. Returns whether a model is now loaded.
    pub fn load(&self) -> Result<bool, StoreError> {
        let _guard = self.training.lock().unwrap_or_else(PoisonError::into_inner);
        match self.store.load()? {
            Some(model) => {
                self.install_loaded(model);
                Ok(true)
            }
            None => Ok(self.is_loaded()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Current model snapshot
    pub fn current(&self) -> Option<Arc<TrainedModel>> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current snapshot, falling back to the persisted artifact.
    ///
    /// The artifact is read under the training lock and only installed if
    /// no model appeared meanwhile, so a model from a retrain that could not
    /// be persisted is never replaced by an older file.
    fn current_or_load(&self) -> Result<Option<Arc<TrainedModel>>, StoreError> {
        if let Some(model) = self.current() {
            return Ok(Some(model));
        }

        let _guard = self.training.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = self.current() {
            return Ok(Some(model));
        }
        Ok(self.store.load()?.map(|model| self.install_loaded(model)))
    }

    /// Predict a validated record, loading the persisted model on first use
    pub fn predict(&self, record: &StudentRecord) -> Result<PredictionResult, InferenceError> {
        let result = self.predict_inner(record);
        match &result {
            Ok(_) => self.metrics.inc_predictions(),
            Err(e) => {
                self.metrics.inc_prediction_errors();
                debug!(error = %e, "Prediction failed");
            }
        }
        result
    }

    fn predict_inner(&self, record: &StudentRecord) -> Result<PredictionResult, InferenceError> {
        let start = Instant::now();
        let model = self
            .current_or_load()?
            .ok_or(InferenceError::ModelUnavailable)?;

        let prediction = self.engine.predict(model.as_ref(), record)?;
        self.logger.log_prediction(
            prediction.score,
            prediction.spread,
            prediction.tier.as_str(),
            prediction.confidence_level.as_str(),
            start.elapsed().as_micros() as u64,
        );
        Ok(prediction)
    }

    /// Train a model, or load the existing artifact unless `force` is set.
    ///
    /// A fitted model that cannot be persisted is still served; the report
    /// carries `persisted: false` and a warning.
    pub fn train(&self, force: bool) -> Result<TrainingReport, TrainingError> {
        let _guard = self
            .training
            .lock()
            .map_err(|e| TrainingError::Internal(format!("Lock poisoned: {}", e)))?;

        if !force && self.store.exists() {
            match self.store.load() {
                Ok(Some(model)) => {
                    self.install_loaded(model);
                    self.metrics.inc_trainings(outcome::LOADED);
                    return Ok(TrainingReport::already_trained());
                }
                Ok(None) => {}
                Err(e) => warn!(
                    error = %e,
                    path = %self.store.path().display(),
                    "Existing model artifact unusable, training a new model"
                ),
            }
        }

        let fitted = self.pipeline.run().map_err(|e| {
            self.metrics.inc_trainings(outcome::FAILED);
            e
        })?;

        let warning = match self.store.save(&fitted.model) {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    error = %e,
                    path = %self.store.path().display(),
                    "Failed to persist trained model"
                );
                Some(format!("Model could not be saved: {}", e))
            }
        };

        let report = fitted.report(warning);
        self.metrics.observe_training_duration(fitted.duration_secs);
        self.metrics.set_training_scores(fitted.mse, fitted.r2);
        self.metrics.inc_trainings(outcome::FITTED);
        self.logger.log_model_trained(
            fitted.mse,
            fitted.r2,
            fitted.train_rows,
            fitted.test_rows,
            report.persisted,
        );

        self.install(fitted.model);
        Ok(report)
    }

    /// Metadata about the loaded model
    pub fn info(&self) -> ModelInfo {
        match self.current() {
            Some(model) => ModelInfo {
                loaded: true,
                details: Some(model.details(self.store.path())),
                message: None,
            },
            None => ModelInfo::not_loaded(),
        }
    }

    /// State of the configured training dataset
    pub fn dataset_status(&self) -> DatasetStatus {
        dataset_status(&self.pipeline.config().dataset_path)
    }

    fn install_loaded(&self, model: TrainedModel) -> Arc<TrainedModel> {
        self.logger.log_model_loaded(
            &self.store.path().display().to_string(),
            model.forest().n_estimators(),
        );
        self.install(model)
    }

    fn install(&self, model: TrainedModel) -> Arc<TrainedModel> {
        let model = Arc::new(model);
        *self.model.write().unwrap_or_else(PoisonError::into_inner) = Some(model.clone());
        self.metrics.set_model_loaded(true);
        model
    }
}

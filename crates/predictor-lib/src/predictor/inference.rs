//! Ensemble inference
//!
//! Runs every member of the forest on an encoded record, aggregates the
//! mean as the score and uses the population standard deviation of the
//! members as the spread behind the confidence level.

use super::features::FeatureEncoder;
use super::output::ResponseClassifier;
use super::Regressor;
use crate::error::InferenceError;
use crate::models::{PredictionResult, StudentRecord, NUM_FEATURES};
use crate::observability::ServiceMetrics;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

/// Latency above which an inference is logged as slow
const MAX_INFERENCE_MS: u128 = 50;

/// Turns validated records into classified predictions
pub struct InferenceEngine {
    encoder: FeatureEncoder,
    classifier: ResponseClassifier,
    metrics: ServiceMetrics,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl InferenceEngine {
    pub fn new(classifier: ResponseClassifier) -> Self {
        Self {
            encoder: FeatureEncoder::new(),
            classifier,
            metrics: ServiceMetrics::new(),
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        }
    }

    pub fn classifier(&self) -> &ResponseClassifier {
        &self.classifier
    }

    /// Predict a record with the given model.
    ///
    /// Either a complete result or an error; never a partial result.
    pub fn predict<M: Regressor + ?Sized>(
        &self,
        model: &M,
        record: &StudentRecord,
    ) -> Result<PredictionResult, InferenceError> {
        let start = Instant::now();

        if model.n_features() != NUM_FEATURES {
            return Err(InferenceError::Internal(format!(
                "model expects {} features, encoder produces {}",
                model.n_features(),
                NUM_FEATURES
            )));
        }

        let features = self.encoder.encode(record);
        let members = model.member_predictions(&features);
        let (_, spread) = mean_and_spread(&members).ok_or_else(|| {
            InferenceError::Internal("model produced no member predictions".to_string())
        })?;
        let score = model.predict(&features);

        if !score.is_finite() || !spread.is_finite() {
            return Err(InferenceError::Internal(
                "model produced a non-finite prediction".to_string(),
            ));
        }

        let result = self.classifier.classify(score, spread);

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        self.metrics.observe_prediction_latency(elapsed.as_secs_f64());

        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                members = members.len(),
                "Inference exceeded {}ms target",
                MAX_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros() as u64, "Inference completed");
        }

        Ok(result)
    }

    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new(ResponseClassifier::new())
    }
}

/// Inference statistics
#[derive(Debug, Clone)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}

/// Mean and population standard deviation; `None` for an empty slice
pub fn mean_and_spread(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

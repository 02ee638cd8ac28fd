//! Observability infrastructure for the grade predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, training duration, model state)
//! - Structured logging of service events with tracing

use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, Gauge, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Histogram buckets for training duration (in seconds)
const TRAINING_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Training outcome label values
pub mod outcome {
    pub const FITTED: &str = "fitted";
    pub const LOADED: &str = "loaded";
    pub const FAILED: &str = "failed";
}

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MetricsInner> = OnceLock::new();

struct MetricsInner {
    prediction_latency_seconds: Histogram,
    training_duration_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    trainings_total: IntCounterVec,
    model_loaded: IntGauge,
    last_training_r2: Gauge,
    last_training_mse: Gauge,
}

impl MetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "grade_predictor_prediction_latency_seconds",
                "Time spent running the forest for a single prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            training_duration_seconds: register_histogram!(
                "grade_predictor_training_duration_seconds",
                "Time spent loading the dataset and fitting the forest",
                TRAINING_BUCKETS.to_vec()
            )
            .expect("Failed to register training_duration_seconds"),

            predictions_total: register_int_counter!(
                "grade_predictor_predictions_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "grade_predictor_prediction_errors_total",
                "Total number of failed prediction requests"
            )
            .expect("Failed to register prediction_errors_total"),

            trainings_total: register_int_counter_vec!(
                "grade_predictor_trainings_total",
                "Training requests by outcome",
                &["outcome"]
            )
            .expect("Failed to register trainings_total"),

            model_loaded: register_int_gauge!(
                "grade_predictor_model_loaded",
                "1 when a trained model is loaded in memory"
            )
            .expect("Failed to register model_loaded"),

            last_training_r2: register_gauge!(
                "grade_predictor_last_training_r2",
                "R squared of the most recent fit on its test partition"
            )
            .expect("Failed to register last_training_r2"),

            last_training_mse: register_gauge!(
                "grade_predictor_last_training_mse",
                "Mean squared error of the most recent fit on its test partition"
            )
            .expect("Failed to register last_training_mse"),
        }
    }
}

/// Handle to the process-wide Prometheus metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MetricsInner {
        GLOBAL_METRICS.get_or_init(MetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn observe_training_duration(&self, duration_secs: f64) {
        self.inner().training_duration_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    /// Count a training request under one of the [`outcome`] labels
    pub fn inc_trainings(&self, outcome: &str) {
        self.inner()
            .trainings_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn set_model_loaded(&self, loaded: bool) {
        self.inner().model_loaded.set(i64::from(loaded));
    }

    pub fn set_training_scores(&self, mse: f64, r2: f64) {
        self.inner().last_training_mse.set(mse);
        self.inner().last_training_r2.set(r2);
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Log a served prediction
    pub fn log_prediction(
        &self,
        score: f64,
        spread: f64,
        tier: &str,
        confidence_level: &str,
        latency_us: u64,
    ) {
        info!(
            event = "prediction_generated",
            service = %self.service_name,
            score = score,
            spread = spread,
            tier = %tier,
            confidence_level = %confidence_level,
            latency_us = latency_us,
            "Prediction served: {:.2} ± {:.2}",
            score,
            spread
        );
    }

    /// Log a completed fit
    pub fn log_model_trained(
        &self,
        mse: f64,
        r2: f64,
        train_rows: usize,
        test_rows: usize,
        persisted: bool,
    ) {
        if persisted {
            info!(
                event = "model_trained",
                service = %self.service_name,
                mse = mse,
                r2 = r2,
                train_rows = train_rows,
                test_rows = test_rows,
                persisted = true,
                "Model trained - MSE: {:.4}, R2: {:.4}",
                mse,
                r2
            );
        } else {
            warn!(
                event = "model_trained",
                service = %self.service_name,
                mse = mse,
                r2 = r2,
                train_rows = train_rows,
                test_rows = test_rows,
                persisted = false,
                "Model trained but could not be persisted, serving from memory only"
            );
        }
    }

    /// Log a model loaded from disk
    pub fn log_model_loaded(&self, path: &str, n_estimators: usize) {
        info!(
            event = "model_loaded",
            service = %self.service_name,
            model_path = %path,
            n_estimators = n_estimators,
            "Model loaded from {}",
            path
        );
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, address: &str, model_loaded: bool) {
        info!(
            event = "service_started",
            service = %self.service_name,
            version = %version,
            address = %address,
            model_loaded = model_loaded,
            "Grade predictor started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Grade predictor shutting down"
        );
    }
}

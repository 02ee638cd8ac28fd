//! Grade prediction library
//!
//! This crate provides the core functionality for:
//! - Validating student indicator records
//! - Training a random forest regressor from a CSV dataset
//! - Persisting and loading the trained model
//! - Predicting a score with a tier and an ensemble confidence level
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod schema;
pub mod service;
pub mod store;
pub mod training;

#[cfg(test)]
mod test_support;

pub use error::{FitError, InferenceError, StoreError, TrainingError, ValidationError};
pub use health::{HealthReport, ServiceStatus, UnhealthyResponse};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use service::ModelService;
pub use store::{ModelStore, TrainedModel};

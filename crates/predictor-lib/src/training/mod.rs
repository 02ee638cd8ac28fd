//! Model training from the tabular dataset
//!
//! This module provides:
//! - CSV loading with column validation and row cleaning
//! - Seeded train/test splitting
//! - Forest fitting and held-out evaluation (MSE, R²)

mod dataset;
mod metrics;
mod pipeline;


pub use dataset::{dataset_status, train_test_split, Dataset, Split};
pub use metrics::{mean_squared_error, r2_score};
pub use pipeline::{
    SplitConfig, TrainingConfig, TrainingOutcome, TrainingPipeline, DEFAULT_SPLIT_SEED,
    DEFAULT_TEST_SIZE,
};

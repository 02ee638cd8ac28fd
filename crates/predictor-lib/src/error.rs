//! Error taxonomy for validation, training, persistence and inference

use std::path::PathBuf;
use thiserror::Error;

/// Input record rejected at the boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("unknown fields: {}", .0.join(", "))]
    UnknownFields(Vec<String>),

    #[error("field '{field}' was given more than once")]
    DuplicateField { field: String },

    #[error("field '{field}' must be a valid number")]
    NotNumeric { field: String },

    #[error("field '{field}' must be between 0 and 100, got {value}")]
    OutOfRange { field: String, value: f64 },

    #[error("request body must be a JSON object")]
    NotAnObject,
}

impl ValidationError {
    /// Name of the offending field, when the error concerns a single one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::NotNumeric { field }
            | Self::OutOfRange { field, .. }
            | Self::DuplicateField { field } => Some(field),
            Self::MissingFields(fields) | Self::UnknownFields(fields) if fields.len() == 1 => {
                fields.first().map(String::as_str)
            }
            _ => None,
        }
    }
}

/// Invalid input handed to the ensemble fitter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("cannot fit with zero samples")]
    EmptyInput,

    #[error("number of rows ({rows}) and targets ({targets}) must match")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("row {row} has {found} features, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row} contains a non-finite value")]
    NonFinite { row: usize },

    #[error("forest needs at least one estimator")]
    NoEstimators,
}

/// Model artifact persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O failure on model artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt model artifact {path:?}: {reason}")]
    CorruptArtifact { path: PathBuf, reason: String },

    #[error("failed to encode model artifact: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures while building a model from the dataset
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("dataset not found at {0:?}")]
    DatasetNotFound(PathBuf),

    #[error("dataset is missing columns: {}", .0.join(", "))]
    SchemaMismatch(Vec<String>),

    #[error("dataset has no valid rows after cleaning")]
    EmptyDataset,

    #[error("dataset has {rows} valid rows, at least 2 are required to split")]
    InsufficientRows { rows: usize },

    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O failure on dataset {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to fit model: {0}")]
    Fit(#[from] FitError),

    #[error("training state unavailable: {0}")]
    Internal(String),
}

impl TrainingError {
    /// True when the failure is caused by the dataset contents or location
    pub fn is_data_problem(&self) -> bool {
        matches!(
            self,
            Self::DatasetNotFound(_)
                | Self::SchemaMismatch(_)
                | Self::EmptyDataset
                | Self::InsufficientRows { .. }
                | Self::Csv(_)
        )
    }
}

/// Failures while serving a prediction
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model not available, train it first")]
    ModelUnavailable,

    #[error("failed to load model: {0}")]
    Store(#[from] StoreError),

    #[error("prediction failed: {0}")]
    Internal(String),
}

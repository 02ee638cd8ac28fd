//! Core data models for the grade predictor

use serde::{Deserialize, Serialize};

/// Number of features the model consumes
pub const NUM_FEATURES: usize = 8;

/// Dataset columns (and JSON field names) in model input order.
///
/// Training and inference must agree on this order.
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] = [
    "prom_tareas_t1",
    "prom_examenes_t1",
    "prom_part_t1",
    "asistencia_t1",
    "prom_tareas_t2",
    "prom_examenes_t2",
    "prom_part_t2",
    "asistencia_t2",
];

/// Short field names accepted as aliases, same order as [`FEATURE_COLUMNS`]
pub const FEATURE_ALIASES: [&str; NUM_FEATURES] = [
    "tareas_t1",
    "examenes_t1",
    "part_t1",
    "asistencia_t1",
    "tareas_t2",
    "examenes_t2",
    "part_t2",
    "asistencia_t2",
];

/// Dataset column holding the third-trimester score
pub const TARGET_COLUMN: &str = "nota_final_t3";

/// Lowest accepted value for any indicator or score
pub const MIN_VALUE: f64 = 0.0;

/// Highest accepted value for any indicator or score
pub const MAX_VALUE: f64 = 100.0;

/// Ordered numeric model input
pub type FeatureVector = [f64; NUM_FEATURES];

/// Two trimesters of academic indicators for one student.
///
/// Construct through [`StudentRecord::new`] or [`StudentRecord::from_fields`]
/// so the range invariant holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Map<String, serde_json::Value>")]
pub struct StudentRecord {
    #[serde(rename = "prom_tareas_t1")]
    pub tareas_t1: f64,
    #[serde(rename = "prom_examenes_t1")]
    pub examenes_t1: f64,
    #[serde(rename = "prom_part_t1")]
    pub part_t1: f64,
    pub asistencia_t1: f64,
    #[serde(rename = "prom_tareas_t2")]
    pub tareas_t2: f64,
    #[serde(rename = "prom_examenes_t2")]
    pub examenes_t2: f64,
    #[serde(rename = "prom_part_t2")]
    pub part_t2: f64,
    pub asistencia_t2: f64,
}

/// Performance tier derived from the predicted score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Medium => "medium",
            Tier::High => "high",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence level derived from ensemble spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prediction output returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Estimated third-trimester score, rounded to 2 decimals
    pub score: f64,
    pub tier: Tier,
    pub confidence_level: ConfidenceLevel,
    /// Standard deviation across ensemble members, rounded to 2 decimals
    pub spread: f64,
    pub message: String,
}

/// Outcome of a training request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mse: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_estimators: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_rows: Option<usize>,
    pub loaded: bool,
    /// False when the fitted model could not be written to disk
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl TrainingReport {
    /// Report for a model that already existed and was only loaded
    pub fn already_trained() -> Self {
        Self {
            message: "Model already exists and was loaded".to_string(),
            mse: None,
            r2: None,
            n_estimators: None,
            train_rows: None,
            test_rows: None,
            loaded: true,
            persisted: true,
            warning: None,
        }
    }

    /// True when this report describes a freshly fitted model
    pub fn is_fresh(&self) -> bool {
        self.mse.is_some()
    }
}

/// Metadata about the currently loaded model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub loaded: bool,
    #[serde(flatten)]
    pub details: Option<ModelDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub n_features: usize,
    pub feature_names: Vec<String>,
    pub model_path: String,
    pub trained_at: chrono::DateTime<chrono::Utc>,
}

impl ModelInfo {
    pub fn not_loaded() -> Self {
        Self {
            loaded: false,
            details: None,
            message: Some("Model not loaded".to_string()),
        }
    }
}

/// State of the training dataset on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatus {
    pub exists: bool,
    pub path: String,
    #[serde(default)]
    pub total_rows: usize,
    #[serde(default)]
    pub valid_rows: usize,
    #[serde(default)]
    pub columns: Vec<String>,
    pub required_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Every column the dataset must provide, features first
pub fn required_columns() -> Vec<String> {
    FEATURE_COLUMNS
        .iter()
        .chain(std::iter::once(&TARGET_COLUMN))
        .map(|c| c.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_columns_order() {
        let cols = required_columns();
        assert_eq!(cols.len(), NUM_FEATURES + 1);
        assert_eq!(cols[0], "prom_tareas_t1");
        assert_eq!(cols[NUM_FEATURES], TARGET_COLUMN);
    }

    #[test]
    fn test_labels_serialize_lowercase() {
        let json = serde_json::to_string(&Tier::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        let json = serde_json::to_string(&ConfidenceLevel::High).unwrap();
        assert_eq!(json, "\"high\"");
    }

    #[test]
    fn test_already_trained_report_omits_metrics() {
        let report = TrainingReport::already_trained();
        assert!(!report.is_fresh());
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("mse").is_none());
        assert_eq!(value["loaded"], true);
    }

    #[test]
    fn test_model_info_not_loaded_shape() {
        let value = serde_json::to_value(ModelInfo::not_loaded()).unwrap();
        assert_eq!(value["loaded"], false);
        assert_eq!(value["message"], "Model not loaded");
        assert!(value.get("n_estimators").is_none());
    }
}

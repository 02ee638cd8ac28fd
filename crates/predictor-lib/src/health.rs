//! Health reporting for the grade predictor
//!
//! Aggregates model and dataset state into the payload served by the
//! health endpoint.

use crate::service::ModelService;
use serde::{Deserialize, Serialize};

/// Kind label reported for the loaded model
pub const MODEL_KIND: &str = "RandomForestRegressor";

/// Overall service status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Service is answering requests
    Healthy,
    /// Health could not be determined
    Unhealthy,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Unhealthy => "unhealthy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHealth {
    pub loaded: bool,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetHealth {
    pub exists: bool,
    /// Rows that survive cleaning
    pub rows: usize,
}

/// Health payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: ServiceStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub model: ModelHealth,
    pub dataset: DatasetHealth,
    pub endpoints: Vec<String>,
}

/// Body returned when the health check itself fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnhealthyResponse {
    pub status: ServiceStatus,
    pub error: String,
}

impl UnhealthyResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: ServiceStatus::Unhealthy,
            error: error.into(),
        }
    }
}

impl HealthReport {
    /// Collect the current state of the service.
    ///
    /// Reads the dataset from disk to count valid rows.
    pub fn collect(service: &ModelService, version: &str, endpoints: &[&str]) -> Self {
        let dataset = service.dataset_status();
        Self {
            status: ServiceStatus::Healthy,
            timestamp: chrono::Utc::now(),
            version: version.to_string(),
            model: ModelHealth {
                loaded: service.is_loaded(),
                kind: MODEL_KIND.to_string(),
            },
            dataset: DatasetHealth {
                exists: dataset.exists,
                rows: dataset.valid_rows,
            },
            endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{ForestParams, ResponseClassifier};
    use crate::store::ModelStore;
    use crate::test_support::write_dataset;
    use crate::training::{SplitConfig, TrainingConfig, TrainingPipeline};
    use tempfile::TempDir;

    #[test]
    fn test_health_before_and_after_training() {
        let dir = TempDir::new().unwrap();
        let dataset_path = write_dataset(dir.path(), 60);
        let service = ModelService::new(
            ModelStore::new(dir.path().join("model.json")),
            TrainingPipeline::new(TrainingConfig {
                dataset_path,
                forest: ForestParams {
                    n_estimators: 5,
                    ..Default::default()
                },
                split: SplitConfig::default(),
            }),
            ResponseClassifier::new(),
        );

        let before = HealthReport::collect(&service, "0.1.0", &["/health"]);
        assert_eq!(before.status, ServiceStatus::Healthy);
        assert!(!before.model.loaded);
        assert_eq!(before.model.kind, MODEL_KIND);
        assert!(before.dataset.exists);
        assert_eq!(before.dataset.rows, 60);
        assert_eq!(before.endpoints, vec!["/health".to_string()]);

        service.train(true).unwrap();
        let after = HealthReport::collect(&service, "0.1.0", &[]);
        assert!(after.model.loaded);
    }

    #[test]
    fn test_missing_dataset_reports_zero_rows() {
        let dir = TempDir::new().unwrap();
        let service = ModelService::new(
            ModelStore::new(dir.path().join("model.json")),
            TrainingPipeline::new(TrainingConfig::new(dir.path().join("absent.csv"))),
            ResponseClassifier::new(),
        );

        let report = HealthReport::collect(&service, "0.1.0", &[]);
        assert!(!report.dataset.exists);
        assert_eq!(report.dataset.rows, 0);
    }

    #[test]
    fn test_unhealthy_shape() {
        let value = serde_json::to_value(UnhealthyResponse::new("boom")).unwrap();
        assert_eq!(value["status"], "unhealthy");
        assert_eq!(value["error"], "boom");
    }
}

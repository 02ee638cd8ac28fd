//! Service configuration
//!
//! Values come from an optional `predictor.toml` in the working directory,
//! overridden by `PREDICTOR_*` environment variables. Nested keys use a
//! double underscore, e.g. `PREDICTOR_FOREST__N_ESTIMATORS=200`.

use predictor_lib::predictor::{ClassifierConfig, ForestParams, ResponseClassifier};
use predictor_lib::training::{SplitConfig, TrainingConfig, TrainingPipeline};
use predictor_lib::{ModelService, ModelStore};
use serde::Deserialize;
use std::path::PathBuf;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Address to bind the HTTP server to
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// CSV dataset used for training
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Where the trained model artifact is stored
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Default tracing filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default)]
    pub thresholds: ClassifierConfig,

    #[serde(default)]
    pub forest: ForestParams,

    #[serde(default)]
    pub split: SplitConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/notas_dataset.csv")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("ml_models/modelo_notas.json")
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dataset_path: default_dataset_path(),
            model_path: default_model_path(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            thresholds: ClassifierConfig::default(),
            forest: ForestParams::default(),
            split: SplitConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from config file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("predictor").required(false))
            .add_source(
                config::Environment::with_prefix("PREDICTOR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_config(config)
    }

    /// Deserialize and validate an already built configuration
    pub fn from_config(config: config::Config) -> Result<Self, config::ConfigError> {
        let parsed: Self = config.try_deserialize()?;
        parsed.validate().map_err(config::ConfigError::Message)?;
        Ok(parsed)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), String> {
        let t = &self.thresholds;
        if t.score_low > t.score_high {
            return Err(format!(
                "thresholds.score_low ({}) must not exceed thresholds.score_high ({})",
                t.score_low, t.score_high
            ));
        }
        if t.confidence_high > t.confidence_medium {
            return Err(format!(
                "thresholds.confidence_high ({}) must not exceed thresholds.confidence_medium ({})",
                t.confidence_high, t.confidence_medium
            ));
        }
        if self.forest.n_estimators == 0 {
            return Err("forest.n_estimators must be at least 1".to_string());
        }
        if !(self.split.test_size > 0.0 && self.split.test_size < 1.0) {
            return Err(format!(
                "split.test_size must be in (0, 1), got {}",
                self.split.test_size
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            dataset_path: self.dataset_path.clone(),
            forest: self.forest,
            split: self.split,
        }
    }

    /// Assemble the model service described by this configuration
    pub fn build_service(&self) -> ModelService {
        ModelService::new(
            ModelStore::new(&self.model_path),
            TrainingPipeline::new(self.training_config()),
            ResponseClassifier::with_config(self.thresholds),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(overrides: &[(&str, &str)]) -> Result<ServiceConfig, config::ConfigError> {
        let mut builder = config::Config::builder();
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }
        ServiceConfig::from_config(builder.build()?)
    }

    #[test]
    fn test_defaults() {
        let config = build(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.dataset_path, PathBuf::from("data/notas_dataset.csv"));
        assert_eq!(config.model_path, PathBuf::from("ml_models/modelo_notas.json"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.thresholds, ClassifierConfig::default());
        assert_eq!(config.forest, ForestParams::default());
        assert_eq!(config.split.test_size, 0.2);
        assert_eq!(config.split.random_state, 42);
    }

    #[test]
    fn test_nested_overrides() {
        let config = build(&[
            ("port", "9100"),
            ("log_format", "pretty"),
            ("forest.n_estimators", "50"),
            ("thresholds.score_low", "60"),
        ])
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.forest.n_estimators, 50);
        assert_eq!(config.forest.max_depth, 10);
        assert_eq!(config.thresholds.score_low, 60.0);
        assert_eq!(config.thresholds.score_high, 85.0);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(build(&[("split.test_size", "1.5")]).is_err());
        assert!(build(&[("forest.n_estimators", "0")]).is_err());
        assert!(build(&[("thresholds.score_low", "90")]).is_err());
    }
}

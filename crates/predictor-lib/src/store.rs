//! Model artifact persistence
//!
//! A trained model is written as a JSON envelope:
//!
//! ```json
//! { "format_version": 1, "checksum": "<sha256 hex>", "model": { ... } }
//! ```
//!
//! The checksum covers the exact bytes of `model`. Writes go to a temp
//! file that is synced and then renamed over the target, so a reader never
//! observes a half-written artifact.

use crate::error::StoreError;
use crate::models::{ModelDetails, FEATURE_COLUMNS};
use crate::predictor::{ForestParams, RandomForest, Regressor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current artifact layout version
pub const FORMAT_VERSION: u32 = 1;

/// A fitted forest together with what it was trained on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    forest: RandomForest,
    feature_names: Vec<String>,
    trained_at: DateTime<Utc>,
}

impl TrainedModel {
    pub fn new(forest: RandomForest, feature_names: Vec<String>) -> Self {
        Self {
            forest,
            feature_names,
            trained_at: Utc::now(),
        }
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    pub fn params(&self) -> &ForestParams {
        self.forest.params()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Metadata exposed by the info endpoint
    pub fn details(&self, model_path: &Path) -> ModelDetails {
        let params = self.params();
        ModelDetails {
            n_estimators: self.forest.n_estimators(),
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            n_features: self.forest.n_features(),
            feature_names: self.feature_names.clone(),
            model_path: model_path.display().to_string(),
            trained_at: self.trained_at,
        }
    }
}

impl Regressor for TrainedModel {
    fn predict(&self, features: &[f64]) -> f64 {
        self.forest.predict(features)
    }

    fn member_predictions(&self, features: &[f64]) -> Vec<f64> {
        self.forest.member_predictions(features)
    }

    fn n_features(&self) -> usize {
        self.forest.n_features()
    }
}

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    format_version: u32,
    checksum: String,
    model: &'a RawValue,
}

#[derive(Deserialize)]
struct EnvelopeIn<'a> {
    format_version: u32,
    checksum: String,
    #[serde(borrow)]
    model: &'a RawValue,
}

/// Reads and writes the model artifact at a fixed path
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the artifact; `Ok(None)` when nothing has been saved yet
    pub fn load(&self) -> Result<Option<TrainedModel>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No model artifact on disk");
                return Ok(None);
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let envelope: EnvelopeIn<'_> =
            serde_json::from_str(&text).map_err(|e| self.corrupt(e.to_string()))?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(self.corrupt(format!(
                "unsupported format version {}, expected {}",
                envelope.format_version, FORMAT_VERSION
            )));
        }

        let computed = compute_checksum(envelope.model.get().as_bytes());
        if computed != envelope.checksum {
            return Err(self.corrupt(format!(
                "checksum mismatch: expected {}, got {}",
                envelope.checksum, computed
            )));
        }

        let model: TrainedModel = serde_json::from_str(envelope.model.get())
            .map_err(|e| self.corrupt(format!("invalid model body: {}", e)))?;

        if model.forest.n_features() != model.feature_names.len()
            || model.feature_names.iter().zip(FEATURE_COLUMNS.iter()).any(|(a, b)| a != b)
        {
            return Err(self.corrupt(format!(
                "model was trained on features {:?}",
                model.feature_names
            )));
        }

        info!(
            path = %self.path.display(),
            checksum = %computed,
            n_estimators = model.forest.n_estimators(),
            "Model artifact loaded"
        );
        Ok(Some(model))
    }

    /// Persist the model, replacing any previous artifact
    pub fn save(&self, model: &TrainedModel) -> Result<(), StoreError> {
        let body = RawValue::from_string(serde_json::to_string(model)?)?;
        let checksum = compute_checksum(body.get().as_bytes());
        let envelope = EnvelopeOut {
            format_version: FORMAT_VERSION,
            checksum: checksum.clone(),
            model: &*body,
        };
        let bytes = serde_json::to_vec(&envelope)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        // Write to temp file first
        let temp_path = self.path.with_extension("tmp");
        let io_err = |source| StoreError::Io {
            path: temp_path.clone(),
            source,
        };
        let mut file = File::create(&temp_path).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!(
            path = %self.path.display(),
            size = bytes.len(),
            checksum = %checksum,
            "Model artifact saved"
        );
        Ok(())
    }

    fn corrupt(&self, reason: String) -> StoreError {
        StoreError::CorruptArtifact {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Compute SHA256 checksum of data
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

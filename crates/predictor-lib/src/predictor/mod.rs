//! ML prediction engine

mod features;
mod forest;
mod inference;
mod output;

pub use features::FeatureEncoder;
pub use forest::{
    ForestParams, RandomForest, RegressionTree, TreeNode, DEFAULT_MAX_DEPTH,
    DEFAULT_MIN_SAMPLES_LEAF, DEFAULT_MIN_SAMPLES_SPLIT, DEFAULT_N_ESTIMATORS,
    DEFAULT_RANDOM_STATE,
};
pub use inference::{mean_and_spread, InferenceEngine, InferenceStats};
pub use output::{
    build_message, message_for_labels, round2, ClassifierConfig, ResponseClassifier,
    DEFAULT_CONFIDENCE_HIGH, DEFAULT_CONFIDENCE_MEDIUM, DEFAULT_SCORE_HIGH, DEFAULT_SCORE_LOW,
};

/// An ensemble regressor the inference engine can query
pub trait Regressor: Send + Sync {
    /// Aggregate prediction for one encoded sample
    fn predict(&self, features: &[f64]) -> f64;

    /// Prediction of every ensemble member for one encoded sample
    fn member_predictions(&self, features: &[f64]) -> Vec<f64>;

    /// Number of features the model was trained on
    fn n_features(&self) -> usize;
}

impl Regressor for RandomForest {
    fn predict(&self, features: &[f64]) -> f64 {
        RandomForest::predict(self, features)
    }

    fn member_predictions(&self, features: &[f64]) -> Vec<f64> {
        RandomForest::member_predictions(self, features)
    }

    fn n_features(&self) -> usize {
        RandomForest::n_features(self)
    }
}

//! Prediction output classification and formatting
//!
//! Turns a raw score and ensemble spread into the tier, confidence level
//! and human-readable message returned to callers.

use crate::models::{ConfidenceLevel, PredictionResult, Tier};
use serde::{Deserialize, Serialize};

/// Scores below this are low tier
pub const DEFAULT_SCORE_LOW: f64 = 65.0;

/// Scores at or above this are high tier
pub const DEFAULT_SCORE_HIGH: f64 = 85.0;

/// Spread at or below this is high confidence
pub const DEFAULT_CONFIDENCE_HIGH: f64 = 5.0;

/// Spread at or below this (and above the high bound) is medium confidence
pub const DEFAULT_CONFIDENCE_MEDIUM: f64 = 10.0;

/// Classification thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub score_low: f64,
    pub score_high: f64,
    pub confidence_high: f64,
    pub confidence_medium: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            score_low: DEFAULT_SCORE_LOW,
            score_high: DEFAULT_SCORE_HIGH,
            confidence_high: DEFAULT_CONFIDENCE_HIGH,
            confidence_medium: DEFAULT_CONFIDENCE_MEDIUM,
        }
    }
}

/// Classifies raw predictions into caller-facing results
#[derive(Debug, Clone, Default)]
pub struct ResponseClassifier {
    config: ClassifierConfig,
}

impl ResponseClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify_score(&self, score: f64) -> Tier {
        if score < self.config.score_low {
            Tier::Low
        } else if score < self.config.score_high {
            Tier::Medium
        } else {
            Tier::High
        }
    }

    pub fn classify_confidence(&self, spread: f64) -> ConfidenceLevel {
        if spread <= self.config.confidence_high {
            ConfidenceLevel::High
        } else if spread <= self.config.confidence_medium {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Assemble the full result. Labels are derived from the unrounded
    /// values; score and spread are rounded to 2 decimals afterwards.
    pub fn classify(&self, score: f64, spread: f64) -> PredictionResult {
        let tier = self.classify_score(score);
        let confidence_level = self.classify_confidence(spread);
        PredictionResult {
            score: round2(score),
            tier,
            confidence_level,
            spread: round2(spread),
            message: build_message(score, tier, confidence_level),
        }
    }
}

/// Tier-keyed sentence with a confidence qualifier
pub fn build_message(score: f64, tier: Tier, confidence: ConfidenceLevel) -> String {
    message_for_labels(score, tier.as_str(), confidence.as_str())
}

/// Message from raw labels, as received from an older client or artifact.
///
/// An unrecognised tier produces a generic sentence without qualifier.
pub fn message_for_labels(score: f64, tier: &str, confidence: &str) -> String {
    let base = match tier {
        "high" => format!("Excellent work! Estimated score of {:.1} (high performance)", score),
        "medium" => format!("Good performance. Estimated score of {:.1} (medium performance)", score),
        "low" => format!(
            "There is room for improvement. Estimated score of {:.1} (low performance)",
            score
        ),
        _ => return format!("Estimated score of {:.1}.", score),
    };

    match confidence_phrase(confidence) {
        Some(phrase) => format!("{} {}.", base, phrase),
        None => format!("{}.", base),
    }
}

fn confidence_phrase(confidence: &str) -> Option<&'static str> {
    match confidence {
        "high" => Some("with high confidence"),
        "medium" => Some("with moderate confidence"),
        "low" => Some("with low confidence"),
        _ => None,
    }
}

/// Round to 2 decimals using the exact decimal value of the float.
///
/// Scaling by 100 first would push values like 2.675 (stored as
/// 2.67499999...) across the tie; formatting works on the exact expansion
/// and breaks true ties to even.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.2}", value).parse().unwrap_or(value)
}

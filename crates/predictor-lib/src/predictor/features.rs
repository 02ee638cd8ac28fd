//! Feature encoding for ML inference
//!
//! Maps a validated student record to the fixed-order vector the forest
//! was trained on. The order is [`FEATURE_COLUMNS`]:
//! homework, exams, participation and attendance for T1, then the same
//! four for T2.

use crate::models::{FeatureVector, StudentRecord, FEATURE_COLUMNS, NUM_FEATURES};

/// Encodes student records into model input vectors
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode a record in training column order
    pub fn encode(&self, record: &StudentRecord) -> FeatureVector {
        record.values()
    }

    /// Names of the encoded positions
    pub fn feature_names(&self) -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    pub fn num_features(&self) -> usize {
        NUM_FEATURES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_documented_order() {
        let record = StudentRecord::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0).unwrap();
        let features = FeatureEncoder::new().encode(&record);
        assert_eq!(features, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_encode_matches_field_names() {
        let record = StudentRecord::new(85.0, 78.0, 92.0, 95.0, 87.0, 82.0, 88.0, 93.0).unwrap();
        let encoder = FeatureEncoder::new();
        let features = encoder.encode(&record);
        let names = encoder.feature_names();

        assert_eq!(names.len(), encoder.num_features());
        let lookup = |name: &str| features[names.iter().position(|n| n == name).unwrap()];
        assert_eq!(lookup("prom_tareas_t1"), record.tareas_t1);
        assert_eq!(lookup("asistencia_t1"), record.asistencia_t1);
        assert_eq!(lookup("prom_examenes_t2"), record.examenes_t2);
        assert_eq!(lookup("asistencia_t2"), record.asistencia_t2);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let record = StudentRecord::new(10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0).unwrap();
        let encoder = FeatureEncoder::new();
        assert_eq!(encoder.encode(&record), encoder.encode(&record));
    }
}

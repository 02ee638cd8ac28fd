//! Validation of student input records
//!
//! Requests arrive as loosely typed JSON objects. Every value is coerced to
//! a float, range checked against [0, 100], and unknown or missing fields
//! are rejected here so nothing downstream sees an invalid record.

use crate::error::ValidationError;
use crate::models::{
    StudentRecord, FEATURE_ALIASES, FEATURE_COLUMNS, MAX_VALUE, MIN_VALUE, NUM_FEATURES,
};
use serde_json::{Map, Value};

impl StudentRecord {
    /// Build a record from typed values, checking every range
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tareas_t1: f64,
        examenes_t1: f64,
        part_t1: f64,
        asistencia_t1: f64,
        tareas_t2: f64,
        examenes_t2: f64,
        part_t2: f64,
        asistencia_t2: f64,
    ) -> Result<Self, ValidationError> {
        Self::from_values([
            tareas_t1,
            examenes_t1,
            part_t1,
            asistencia_t1,
            tareas_t2,
            examenes_t2,
            part_t2,
            asistencia_t2,
        ])
    }

    /// Build a record from values in [`FEATURE_COLUMNS`] order
    pub fn from_values(values: [f64; NUM_FEATURES]) -> Result<Self, ValidationError> {
        for (name, value) in FEATURE_COLUMNS.iter().zip(values.iter()) {
            check_range(name, *value)?;
        }
        let [tareas_t1, examenes_t1, part_t1, asistencia_t1, tareas_t2, examenes_t2, part_t2, asistencia_t2] =
            values;
        Ok(Self {
            tareas_t1,
            examenes_t1,
            part_t1,
            asistencia_t1,
            tareas_t2,
            examenes_t2,
            part_t2,
            asistencia_t2,
        })
    }

    /// Validate a JSON object of field name to value.
    ///
    /// Field names may use the dataset column name (`prom_tareas_t1`) or the
    /// short alias (`tareas_t1`). Numeric strings are accepted.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let unknown: Vec<String> = fields
            .keys()
            .filter(|key| column_index(key).is_none())
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(ValidationError::UnknownFields(unknown));
        }

        let mut slots: [Option<&Value>; NUM_FEATURES] = [None; NUM_FEATURES];
        for (key, value) in fields {
            if let Some(idx) = column_index(key) {
                if slots[idx].replace(value).is_some() {
                    return Err(ValidationError::DuplicateField {
                        field: FEATURE_COLUMNS[idx].to_string(),
                    });
                }
            }
        }

        let missing: Vec<String> = slots
            .iter()
            .zip(FEATURE_COLUMNS.iter())
            .filter(|(slot, _)| slot.is_none())
            .map(|(_, name)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let mut values = [0.0; NUM_FEATURES];
        for (idx, slot) in slots.into_iter().enumerate() {
            let name = FEATURE_COLUMNS[idx];
            let value = slot.ok_or_else(|| ValidationError::MissingFields(vec![name.to_string()]))?;
            values[idx] = coerce(name, value)?;
        }

        Self::from_values(values)
    }

    /// Field values in [`FEATURE_COLUMNS`] order
    pub fn values(&self) -> [f64; NUM_FEATURES] {
        [
            self.tareas_t1,
            self.examenes_t1,
            self.part_t1,
            self.asistencia_t1,
            self.tareas_t2,
            self.examenes_t2,
            self.part_t2,
            self.asistencia_t2,
        ]
    }
}

impl TryFrom<Map<String, Value>> for StudentRecord {
    type Error = ValidationError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_fields(&fields)
    }
}

impl TryFrom<&Value> for StudentRecord {
    type Error = ValidationError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Self::from_fields(fields),
            _ => Err(ValidationError::NotAnObject),
        }
    }
}

/// Resolve a column name or alias to its position in the feature order
fn column_index(name: &str) -> Option<usize> {
    FEATURE_COLUMNS
        .iter()
        .position(|c| *c == name)
        .or_else(|| FEATURE_ALIASES.iter().position(|a| *a == name))
}

fn coerce(field: &str, value: &Value) -> Result<f64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::NotNumeric {
            field: field.to_string(),
        }),
    }
}

fn check_range(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotNumeric {
            field: field.to_string(),
        });
    }
    if !(MIN_VALUE..=MAX_VALUE).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

//! Shared fixtures for unit tests

use crate::models::{required_columns, StudentRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

/// Weight of each indicator in the synthetic final score
const WEIGHTS: [f64; 8] = [0.10, 0.25, 0.05, 0.05, 0.15, 0.30, 0.05, 0.05];

/// Deterministic synthetic dataset as CSV text
pub fn synthetic_csv(rows: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut text = required_columns().join(",");
    for _ in 0..rows {
        let features: Vec<f64> = (0..8).map(|_| rng.gen_range(40.0..100.0)).collect();
        let noise: f64 = rng.gen_range(-3.0..3.0);
        let target = (features.iter().zip(WEIGHTS.iter()).map(|(f, w)| f * w).sum::<f64>()
            + noise)
            .clamp(0.0, 100.0);

        text.push('\n');
        let cells: Vec<String> = features
            .iter()
            .chain(std::iter::once(&target))
            .map(|v| format!("{:.1}", v))
            .collect();
        text.push_str(&cells.join(","));
    }
    text.push('\n');
    text
}

/// Write a synthetic dataset under `dir` and return its path
pub fn write_dataset(dir: &Path, rows: usize) -> PathBuf {
    let path = dir.join("notas_dataset.csv");
    std::fs::write(&path, synthetic_csv(rows, 7)).expect("write fixture dataset");
    path
}

/// The reference student used across tests
pub fn example_student() -> StudentRecord {
    StudentRecord::new(85.0, 78.0, 92.0, 95.0, 87.0, 82.0, 88.0, 93.0)
        .expect("example student is in range")
}

//! Training dataset loading, cleaning and splitting

use crate::error::TrainingError;
use crate::models::{
    required_columns, DatasetStatus, FeatureVector, MAX_VALUE, MIN_VALUE, NUM_FEATURES,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::debug;

/// Cleaned rows ready for fitting
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<FeatureVector>,
    targets: Vec<f64>,
    columns: Vec<String>,
    total_rows: usize,
}

impl Dataset {
    /// Read and clean the CSV at `path`
    pub fn load(path: &Path) -> Result<Self, TrainingError> {
        let file = File::open(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => TrainingError::DatasetNotFound(path.to_path_buf()),
            _ => TrainingError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let dataset = Self::from_reader(file)?;
        debug!(
            path = %path.display(),
            total_rows = dataset.total_rows,
            valid_rows = dataset.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Read and clean CSV from any reader.
    ///
    /// Rows with a missing, unparseable or out-of-range value in any required
    /// column are dropped. Extra columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TrainingError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let required = required_columns();
        let positions: Vec<Option<usize>> = required
            .iter()
            .map(|name| columns.iter().position(|c| c == name))
            .collect();

        let missing: Vec<String> = required
            .iter()
            .zip(positions.iter())
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(TrainingError::SchemaMismatch(missing));
        }
        let positions: Vec<usize> = positions.into_iter().flatten().collect();

        let mut features = Vec::new();
        let mut targets = Vec::new();
        let mut total_rows = 0;

        for row in reader.records() {
            let row = row?;
            total_rows += 1;
            if let Some(values) = clean_row(&row, &positions) {
                let mut vector = [0.0; NUM_FEATURES];
                vector.copy_from_slice(&values[..NUM_FEATURES]);
                features.push(vector);
                targets.push(values[NUM_FEATURES]);
            }
        }

        Ok(Self {
            features,
            targets,
            columns,
            total_rows,
        })
    }

    pub fn features(&self) -> &[FeatureVector] {
        &self.features
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// Header columns as read from the file
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows before cleaning
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Rows that survived cleaning
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Parse every required value of a row; `None` if any is unusable
fn clean_row(row: &csv::StringRecord, positions: &[usize]) -> Option<Vec<f64>> {
    positions
        .iter()
        .map(|&pos| {
            let value: f64 = row.get(pos)?.parse().ok()?;
            (value.is_finite() && (MIN_VALUE..=MAX_VALUE).contains(&value)).then_some(value)
        })
        .collect()
}

/// Train and test partitions
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train_x: Vec<FeatureVector>,
    pub train_y: Vec<f64>,
    pub test_x: Vec<FeatureVector>,
    pub test_y: Vec<f64>,
}

/// Shuffle row indices with a seeded generator and hold out
/// `ceil(n * test_size)` rows for testing.
///
/// Both partitions are non-empty; fewer than 2 rows cannot be split.
pub fn train_test_split(
    dataset: &Dataset,
    test_size: f64,
    random_state: u64,
) -> Result<Split, TrainingError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TrainingError::InvalidConfig(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_samples = dataset.len();
    if n_samples == 0 {
        return Err(TrainingError::EmptyDataset);
    }
    if n_samples < 2 {
        return Err(TrainingError::InsufficientRows { rows: n_samples });
    }

    let n_test = ((n_samples as f64 * test_size).ceil() as usize).clamp(1, n_samples - 1);
    let n_train = n_samples - n_test;

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(random_state);
    indices.shuffle(&mut rng);

    let take = |idx: &[usize]| -> (Vec<FeatureVector>, Vec<f64>) {
        idx.iter()
            .map(|&i| (dataset.features[i], dataset.targets[i]))
            .unzip()
    };
    let (train_x, train_y) = take(&indices[..n_train]);
    let (test_x, test_y) = take(&indices[n_train..]);

    Ok(Split {
        train_x,
        train_y,
        test_x,
        test_y,
    })
}

/// Describe the dataset on disk without failing
pub fn dataset_status(path: &Path) -> DatasetStatus {
    let mut status = DatasetStatus {
        exists: path.is_file(),
        path: path.display().to_string(),
        total_rows: 0,
        valid_rows: 0,
        columns: Vec::new(),
        required_columns: required_columns(),
        error: None,
    };

    if !status.exists {
        status.error = Some(format!("Dataset not found at {}", path.display()));
        return status;
    }

    match Dataset::load(path) {
        Ok(dataset) => {
            status.total_rows = dataset.total_rows();
            status.valid_rows = dataset.len();
            status.columns = dataset.columns;
        }
        Err(e) => status.error = Some(e.to_string()),
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "prom_tareas_t1,prom_examenes_t1,prom_part_t1,asistencia_t1,\
prom_tareas_t2,prom_examenes_t2,prom_part_t2,asistencia_t2,nota_final_t3";

    fn csv_with(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    fn numbered(n: usize) -> Dataset {
        let rows: Vec<String> = (0..n)
            .map(|i| {
                let v = (i % 100) as f64;
                format!("{v},{v},{v},{v},{v},{v},{v},{v},{v}")
            })
            .collect();
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        Dataset::from_reader(csv_with(&refs).as_bytes()).unwrap()
    }

    #[test]
    fn test_load_valid_rows() {
        let text = csv_with(&[
            "85,78,92,95,87,82,88,93,86",
            "60,55,70,80,62,58,65,75,61",
        ]);
        let dataset = Dataset::from_reader(text.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.total_rows(), 2);
        assert_eq!(dataset.features()[0], [85.0, 78.0, 92.0, 95.0, 87.0, 82.0, 88.0, 93.0]);
        assert_eq!(dataset.targets(), &[86.0, 61.0]);
    }

    #[test]
    fn test_columns_may_be_reordered_or_extra() {
        let text = "id,nota_final_t3,asistencia_t2,prom_part_t2,prom_examenes_t2,prom_tareas_t2,\
asistencia_t1,prom_part_t1,prom_examenes_t1,prom_tareas_t1\n7,90,8,7,6,5,4,3,2,1";
        let dataset = Dataset::from_reader(text.as_bytes()).unwrap();

        assert_eq!(dataset.features()[0], [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(dataset.targets(), &[90.0]);
        assert_eq!(dataset.columns()[0], "id");
    }

    #[test]
    fn test_missing_columns_reported_in_order() {
        let text = "prom_tareas_t1,prom_examenes_t1,prom_part_t1,asistencia_t1\n1,2,3,4";
        let err = Dataset::from_reader(text.as_bytes()).unwrap_err();
        match err {
            TrainingError::SchemaMismatch(missing) => {
                assert_eq!(missing[0], "prom_tareas_t2");
                assert_eq!(missing.last().map(String::as_str), Some("nota_final_t3"));
                assert_eq!(missing.len(), 5);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_cleaning_drops_bad_rows() {
        let text = csv_with(&[
            "85,78,92,95,87,82,88,93,86",
            "85,78,,95,87,82,88,93,86",
            "85,78,92,150,87,82,88,93,86",
            "85,78,92,95,87,82,88,93,-1",
            "85,78,abc,95,87,82,88,93,86",
            "85,78,92,95",
        ]);
        let dataset = Dataset::from_reader(text.as_bytes()).unwrap();

        assert_eq!(dataset.total_rows(), 6);
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_all_rows_invalid_leaves_empty_dataset() {
        let text = csv_with(&["101,0,0,0,0,0,0,0,50", ",,,,,,,,"]);
        let dataset = Dataset::from_reader(text.as_bytes()).unwrap();
        assert!(dataset.is_empty());

        assert!(matches!(
            train_test_split(&dataset, 0.2, 42),
            Err(TrainingError::EmptyDataset)
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nope.csv");
        assert!(matches!(
            Dataset::load(&path),
            Err(TrainingError::DatasetNotFound(_))
        ));
    }

    #[test]
    fn test_split_sizes_use_ceiling() {
        let split = train_test_split(&numbered(10), 0.2, 42).unwrap();
        assert_eq!(split.test_y.len(), 2);
        assert_eq!(split.train_y.len(), 8);

        let split = train_test_split(&numbered(11), 0.2, 42).unwrap();
        assert_eq!(split.test_y.len(), 3);
        assert_eq!(split.train_y.len(), 8);
    }

    #[test]
    fn test_split_is_deterministic_and_disjoint() {
        let dataset = numbered(50);
        let a = train_test_split(&dataset, 0.2, 42).unwrap();
        let b = train_test_split(&dataset, 0.2, 42).unwrap();
        assert_eq!(a, b);

        let mut all: Vec<f64> = a.train_y.iter().chain(a.test_y.iter()).copied().collect();
        all.sort_by(f64::total_cmp);
        let expected: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_split_needs_two_rows() {
        assert!(matches!(
            train_test_split(&numbered(1), 0.2, 42),
            Err(TrainingError::InsufficientRows { rows: 1 })
        ));
        let split = train_test_split(&numbered(2), 0.2, 42).unwrap();
        assert_eq!(split.train_y.len(), 1);
        assert_eq!(split.test_y.len(), 1);
    }

    #[test]
    fn test_split_rejects_bad_test_size() {
        assert!(matches!(
            train_test_split(&numbered(10), 1.0, 42),
            Err(TrainingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_status_for_missing_file() {
        let status = dataset_status(Path::new("/definitely/not/here.csv"));
        assert!(!status.exists);
        assert_eq!(status.valid_rows, 0);
        assert_eq!(status.required_columns.len(), NUM_FEATURES + 1);
        assert!(status.error.is_some());
    }

    #[test]
    fn test_status_counts_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(
            &path,
            csv_with(&["85,78,92,95,87,82,88,93,86", "85,78,92,95,87,82,88,93,200"]),
        )
        .unwrap();

        let status = dataset_status(&path);
        assert!(status.exists);
        assert_eq!(status.total_rows, 2);
        assert_eq!(status.valid_rows, 1);
        assert_eq!(status.columns.len(), NUM_FEATURES + 1);
        assert!(status.error.is_none());
    }
}

//! Random forest regression
//!
//! CART regression trees grown on bootstrap samples, splitting on the
//! threshold that minimises the summed squared error of the children.
//! Every feature is considered at every split. The forest prediction is
//! the mean of its members; member predictions are exposed so callers can
//! measure how much the trees disagree.

use crate::error::FitError;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Default number of trees
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Default maximum tree depth (root is depth 0)
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default minimum samples required to split a node
pub const DEFAULT_MIN_SAMPLES_SPLIT: usize = 5;

/// Default minimum samples in each leaf
pub const DEFAULT_MIN_SAMPLES_LEAF: usize = 2;

/// Default seed for bootstrap sampling
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Variance below which a node is treated as pure
const PURITY_EPSILON: f64 = 1e-12;

/// Forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub random_state: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_depth: DEFAULT_MAX_DEPTH,
            min_samples_split: DEFAULT_MIN_SAMPLES_SPLIT,
            min_samples_leaf: DEFAULT_MIN_SAMPLES_LEAF,
            random_state: DEFAULT_RANDOM_STATE,
        }
    }
}

/// A node in a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Samples with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf { value: f64, n_samples: usize },
}

impl TreeNode {
    /// Leaves have depth 0
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

/// A single fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    root: TreeNode,
}

impl RegressionTree {
    /// Predict one sample.
    ///
    /// # Panics
    ///
    /// Panics if `x` has fewer features than the tree was trained on.
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }
}

/// Ensemble of bootstrap-trained regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fit a forest on `x` (one row per sample) against targets `y`.
    ///
    /// Tree `i` draws its bootstrap sample from a generator seeded with
    /// `random_state + i`, so identical inputs give identical forests.
    pub fn fit<R: AsRef<[f64]>>(
        params: ForestParams,
        x: &[R],
        y: &[f64],
    ) -> Result<Self, FitError> {
        let n_features = validate_inputs(&params, x, y)?;
        let rows: Vec<&[f64]> = x.iter().map(|r| r.as_ref()).collect();
        let n_samples = rows.len();
        let sample_dist = Uniform::from(0..n_samples);

        let builder = TreeBuilder {
            rows: &rows,
            y,
            n_features,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            min_samples_leaf: params.min_samples_leaf.max(1),
        };

        let trees = (0..params.n_estimators)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.random_state.wrapping_add(i as u64));
                let mut indices: Vec<usize> = (0..n_samples)
                    .map(|_| sample_dist.sample(&mut rng))
                    .collect();
                RegressionTree {
                    root: builder.build(&mut indices, 0),
                }
            })
            .collect();

        Ok(Self {
            params,
            n_features,
            trees,
        })
    }

    /// Mean of all member predictions
    pub fn predict(&self, x: &[f64]) -> f64 {
        let members = self.member_predictions(x);
        members.iter().sum::<f64>() / members.len() as f64
    }

    /// Prediction of every tree, in training order
    pub fn member_predictions(&self, x: &[f64]) -> Vec<f64> {
        self.trees.iter().map(|tree| tree.predict(x)).collect()
    }

    /// Predict many rows at once
    pub fn predict_batch<R: AsRef<[f64]>>(&self, x: &[R]) -> Vec<f64> {
        x.iter().map(|row| self.predict(row.as_ref())).collect()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

fn validate_inputs<R: AsRef<[f64]>>(
    params: &ForestParams,
    x: &[R],
    y: &[f64],
) -> Result<usize, FitError> {
    if params.n_estimators == 0 {
        return Err(FitError::NoEstimators);
    }
    if x.is_empty() {
        return Err(FitError::EmptyInput);
    }
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch {
            rows: x.len(),
            targets: y.len(),
        });
    }

    let n_features = x[0].as_ref().len();
    if n_features == 0 {
        return Err(FitError::EmptyInput);
    }
    for (row, (values, target)) in x.iter().zip(y.iter()).enumerate() {
        let values = values.as_ref();
        if values.len() != n_features {
            return Err(FitError::RaggedRows {
                row,
                expected: n_features,
                found: values.len(),
            });
        }
        if !target.is_finite() || values.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite { row });
        }
    }
    Ok(n_features)
}

/// Best split found for a node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

/// Shared state for growing trees over one training set
struct TreeBuilder<'a> {
    rows: &'a [&'a [f64]],
    y: &'a [f64],
    n_features: usize,
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

impl TreeBuilder<'_> {
    /// Grow a subtree over `indices` (which may repeat samples)
    fn build(&self, indices: &mut [usize], depth: usize) -> TreeNode {
        let n = indices.len();
        let (sum, sum_sq) = indices.iter().fold((0.0, 0.0), |(s, sq), &i| {
            let v = self.y[i];
            (s + v, sq + v * v)
        });
        let mean = sum / n as f64;
        let node_sse = (sum_sq - sum * sum / n as f64).max(0.0);

        if n < self.min_samples_split
            || n < 2 * self.min_samples_leaf
            || depth >= self.max_depth
            || node_sse / (n as f64) < PURITY_EPSILON
        {
            return TreeNode::Leaf {
                value: mean,
                n_samples: n,
            };
        }

        let Some(split) = self.best_split(indices) else {
            return TreeNode::Leaf {
                value: mean,
                n_samples: n,
            };
        };
        if split.sse >= node_sse {
            return TreeNode::Leaf {
                value: mean,
                n_samples: n,
            };
        }

        let mid = partition(indices, |i| self.rows[i][split.feature] <= split.threshold);
        let (left_idx, right_idx) = indices.split_at_mut(mid);

        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(left_idx, depth + 1)),
            right: Box::new(self.build(right_idx, depth + 1)),
        }
    }

    /// Scan every feature for the threshold with the lowest child SSE
    /// that leaves at least `min_samples_leaf` samples on each side.
    fn best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.min_samples_leaf;
        let mut best: Option<SplitCandidate> = None;
        let mut order: Vec<usize> = indices.to_vec();

        let total_sum: f64 = indices.iter().map(|&i| self.y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| self.y[i] * self.y[i]).sum();

        for feature in 0..self.n_features {
            order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for pos in 0..n - 1 {
                let v = self.y[order[pos]];
                left_sum += v;
                left_sq += v * v;

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let lo = self.rows[order[pos]][feature];
                let hi = self.rows[order[pos + 1]][feature];
                if lo >= hi {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / n_left as f64)
                    + (right_sq - right_sum * right_sum / n_right as f64);

                if best.as_ref().map_or(true, |b| sse < b.sse) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        sse,
                    });
                }
            }
        }

        best
    }
}

/// Stable in-place partition; returns the count of elements matching `pred`
fn partition<F: Fn(usize) -> bool>(indices: &mut [usize], pred: F) -> usize {
    let (left, right): (Vec<usize>, Vec<usize>) = indices.iter().partition(|&&i| pred(i));
    let mid = left.len();
    for (slot, value) in indices.iter_mut().zip(left.into_iter().chain(right)) {
        *slot = value;
    }
    mid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        let y: Vec<f64> = x.iter().map(|r| 2.0 * r[0] + 1.0).collect();
        (x, y)
    }

    fn small_params(n_estimators: usize) -> ForestParams {
        ForestParams {
            n_estimators,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_params() {
        let params = ForestParams::default();
        assert_eq!(params.n_estimators, 100);
        assert_eq!(params.max_depth, 10);
        assert_eq!(params.min_samples_split, 5);
        assert_eq!(params.min_samples_leaf, 2);
        assert_eq!(params.random_state, 42);
    }

    #[test]
    fn test_fit_linear_relationship() {
        let (x, y) = linear_data(60);
        let forest = RandomForest::fit(small_params(20), &x, &y).unwrap();

        assert_eq!(forest.n_estimators(), 20);
        assert_eq!(forest.n_features(), 2);

        let pred = forest.predict(&[30.0, 2.0]);
        assert!((pred - 61.0).abs() < 8.0, "prediction was {}", pred);
    }

    #[test]
    fn test_aggregate_is_member_mean() {
        let (x, y) = linear_data(40);
        let forest = RandomForest::fit(small_params(10), &x, &y).unwrap();
        let members = forest.member_predictions(&[12.0, 5.0]);

        assert_eq!(members.len(), 10);
        let mean = members.iter().sum::<f64>() / members.len() as f64;
        assert_eq!(forest.predict(&[12.0, 5.0]), mean);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = linear_data(50);
        let a = RandomForest::fit(small_params(15), &x, &y).unwrap();
        let b = RandomForest::fit(small_params(15), &x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_changes_forest() {
        let (x, y) = linear_data(50);
        let a = RandomForest::fit(small_params(5), &x, &y).unwrap();
        let b = RandomForest::fit(
            ForestParams {
                random_state: 7,
                ..small_params(5)
            },
            &x,
            &y,
        )
        .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_depth_and_leaf_constraints() {
        let (x, y) = linear_data(300);
        let params = ForestParams {
            n_estimators: 5,
            max_depth: 3,
            min_samples_split: 5,
            min_samples_leaf: 2,
            random_state: 1,
        };
        let forest = RandomForest::fit(params, &x, &y).unwrap();

        fn min_leaf(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { n_samples, .. } => *n_samples,
                TreeNode::Split { left, right, .. } => min_leaf(left).min(min_leaf(right)),
            }
        }

        for tree in forest.trees() {
            assert!(tree.depth() <= 3);
            assert!(min_leaf(tree.root()) >= 2);
            assert!(tree.root().leaf_count() <= 8);
        }
    }

    #[test]
    fn test_constant_target_yields_single_leaf() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y = vec![70.0; 20];
        let forest = RandomForest::fit(small_params(3), &x, &y).unwrap();

        for tree in forest.trees() {
            assert_eq!(tree.depth(), 0);
        }
        assert_eq!(forest.predict(&[5.0]), 70.0);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let empty: Vec<Vec<f64>> = Vec::new();
        assert_eq!(
            RandomForest::fit(small_params(2), &empty, &[]).unwrap_err(),
            FitError::EmptyInput
        );

        let x = vec![vec![1.0], vec![2.0]];
        assert_eq!(
            RandomForest::fit(small_params(2), &x, &[1.0]).unwrap_err(),
            FitError::LengthMismatch {
                rows: 2,
                targets: 1
            }
        );

        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(
            RandomForest::fit(small_params(2), &ragged, &[1.0, 2.0]),
            Err(FitError::RaggedRows { row: 1, .. })
        ));

        let nan = vec![vec![1.0], vec![f64::NAN]];
        assert_eq!(
            RandomForest::fit(small_params(2), &nan, &[1.0, 2.0]).unwrap_err(),
            FitError::NonFinite { row: 1 }
        );

        assert_eq!(
            RandomForest::fit(small_params(0), &x, &[1.0, 2.0]).unwrap_err(),
            FitError::NoEstimators
        );
    }

    #[test]
    fn test_partition_is_stable() {
        let mut values = vec![5, 1, 4, 2, 3];
        let mid = partition(&mut values, |v| v % 2 == 1);
        assert_eq!(mid, 3);
        assert_eq!(values, vec![5, 1, 3, 4, 2]);
    }

    #[test]
    fn test_serde_round_trip_preserves_predictions() {
        let (x, y) = linear_data(40);
        let forest = RandomForest::fit(small_params(8), &x, &y).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let restored: RandomForest = serde_json::from_str(&json).unwrap();

        for row in &x {
            assert_eq!(forest.predict(row), restored.predict(row));
        }
    }
}

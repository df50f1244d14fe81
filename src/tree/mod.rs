//! Regression trees used as gradient-boosting base learners.
//!
//! Implements CART-style regression trees with an MSE splitting
//! criterion. The builder works over index subsets so the boosting layer
//! can hand each tree a row subsample and a column subsample without
//! copying the training matrix.

use crate::error::Result;
use crate::primitives::Matrix;
use crate::stats;
use serde::{Deserialize, Serialize};

pub mod gradient_boosting;

pub use gradient_boosting::GradientBoostingClassifier;

/// A node in a regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal decision node with split condition
    Node {
        /// Index of the feature to split on (original column index)
        feature_idx: usize,
        /// Threshold value for the split
        threshold: f32,
        /// Number of training samples that reached this node
        n_samples: usize,
        /// Left subtree (samples where feature <= threshold)
        left: Box<TreeNode>,
        /// Right subtree (samples where feature > threshold)
        right: Box<TreeNode>,
    },
    /// Leaf node predicting the mean of its training targets
    Leaf {
        /// Predicted value (mean of y values in this leaf)
        value: f32,
        /// Number of training samples in this leaf
        n_samples: usize,
    },
}

impl TreeNode {
    /// Returns the depth of the tree rooted at this node.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Node { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum tree depth (root at depth 0)
    pub max_depth: usize,
    /// Minimum samples required to split an internal node
    pub min_samples_split: usize,
    /// Minimum samples required in each leaf
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_samples_split: 10,
            min_samples_leaf: 5,
        }
    }
}

/// Regression decision tree fitted to continuous targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    root: Option<TreeNode>,
    params: TreeParams,
}

impl RegressionTree {
    /// Creates an unfitted tree with the given growth limits.
    #[must_use]
    pub fn new(params: TreeParams) -> Self {
        Self { root: None, params }
    }

    /// Fits the tree to the selected rows of `x` against targets `y`.
    ///
    /// `rows` selects the training subset (row subsample); `features`
    /// restricts which columns may be used for splits (column
    /// subsample). Split thresholds always refer to original column
    /// indices, so prediction runs on full-width samples.
    ///
    /// # Errors
    ///
    /// Returns an error if `y` is shorter than the largest row index or
    /// `rows` is empty.
    pub fn fit(
        &mut self,
        x: &Matrix,
        y: &[f32],
        rows: &[usize],
        features: &[usize],
    ) -> Result<()> {
        if rows.is_empty() {
            return Err("Cannot fit a tree with zero samples".into());
        }
        if x.n_rows() != y.len() {
            return Err("Number of samples in x and y must match".into());
        }
        self.root = Some(build_node(x, y, rows, features, 0, self.params));
        Ok(())
    }

    /// Predicts the value for a single full-width sample.
    ///
    /// Returns 0.0 when the tree has not been fitted; the boosting loop
    /// never queries an unfitted tree.
    #[must_use]
    pub fn predict_one(&self, sample: &[f32]) -> f32 {
        let Some(mut node) = self.root.as_ref() else {
            return 0.0;
        };
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Node {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if sample[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Adds this tree's split-weight contributions into `importances`,
    /// weighted by the number of samples passing through each split.
    pub fn accumulate_importances(&self, importances: &mut [f32]) {
        if let Some(root) = &self.root {
            accumulate_node_importances(root, importances);
        }
    }

    /// Returns the fitted root, if any.
    #[must_use]
    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }
}

fn accumulate_node_importances(node: &TreeNode, importances: &mut [f32]) {
    if let TreeNode::Node {
        feature_idx,
        n_samples,
        left,
        right,
        ..
    } = node
    {
        if *feature_idx < importances.len() {
            importances[*feature_idx] += *n_samples as f32;
        }
        accumulate_node_importances(left, importances);
        accumulate_node_importances(right, importances);
    }
}

/// Recursively grows a subtree over the given row subset.
fn build_node(
    x: &Matrix,
    y: &[f32],
    rows: &[usize],
    features: &[usize],
    depth: usize,
    params: TreeParams,
) -> TreeNode {
    let targets: Vec<f32> = rows.iter().map(|&r| y[r]).collect();

    if rows.len() < params.min_samples_split
        || depth >= params.max_depth
        || stats::variance(&targets) < 1e-10
    {
        return make_leaf(&targets);
    }

    let Some((feature_idx, threshold)) = find_best_split(x, y, rows, features) else {
        return make_leaf(&targets);
    };

    let (left_rows, right_rows) = partition_rows(x, rows, feature_idx, threshold);
    if left_rows.len() < params.min_samples_leaf || right_rows.len() < params.min_samples_leaf {
        return make_leaf(&targets);
    }

    let left = build_node(x, y, &left_rows, features, depth + 1, params);
    let right = build_node(x, y, &right_rows, features, depth + 1, params);

    TreeNode::Node {
        feature_idx,
        threshold,
        n_samples: rows.len(),
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn make_leaf(targets: &[f32]) -> TreeNode {
    TreeNode::Leaf {
        value: stats::mean(targets),
        n_samples: targets.len(),
    }
}

/// Finds the (feature, threshold) pair with the largest variance
/// reduction over the row subset, or None if no split improves.
fn find_best_split(
    x: &Matrix,
    y: &[f32],
    rows: &[usize],
    features: &[usize],
) -> Option<(usize, f32)> {
    let targets: Vec<f32> = rows.iter().map(|&r| y[r]).collect();
    let parent_variance = stats::variance(&targets);
    let n = rows.len() as f32;

    let mut best_gain = 0.0;
    let mut best: Option<(usize, f32)> = None;

    for &feature_idx in features {
        let mut values: Vec<f32> = rows.iter().map(|&r| x.get(r, feature_idx)).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;

            let mut left = Vec::new();
            let mut right = Vec::new();
            for &r in rows {
                if x.get(r, feature_idx) <= threshold {
                    left.push(y[r]);
                } else {
                    right.push(y[r]);
                }
            }
            if left.is_empty() || right.is_empty() {
                continue;
            }

            let weighted = (left.len() as f32 / n) * stats::variance(&left)
                + (right.len() as f32 / n) * stats::variance(&right);
            let gain = parent_variance - weighted;
            if gain > best_gain {
                best_gain = gain;
                best = Some((feature_idx, threshold));
            }
        }
    }

    best
}

fn partition_rows(
    x: &Matrix,
    rows: &[usize],
    feature_idx: usize,
    threshold: f32,
) -> (Vec<usize>, Vec<usize>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &r in rows {
        if x.get(r, feature_idx) <= threshold {
            left.push(r);
        } else {
            right.push(r);
        }
    }
    (left, right)
}

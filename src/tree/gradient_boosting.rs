//! Gradient Boosting Classifier over regression trees.
//!
//! # Algorithm
//!
//! 1. Initialize with a constant prediction (log-odds of the positive
//!    class).
//! 2. For each boosting iteration:
//!    - Compute pseudo-residuals `y - p` under log-loss
//!    - Fit a shallow regression tree to the residuals on a row/column
//!      subsample
//!    - Update raw predictions with `learning_rate` * tree output
//! 3. Final probability = sigmoid(raw prediction).

use super::{RegressionTree, TreeParams};
use crate::error::Result;
use crate::primitives::Matrix;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Logistic sigmoid.
#[must_use]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Gradient Boosting Classifier for binary failure labels.
///
/// Row and column subsampling reduce overfitting; both draws come from a
/// seeded RNG so a fixed `random_state` reproduces the ensemble exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    n_estimators: usize,
    learning_rate: f32,
    tree_params: TreeParams,
    /// Fraction of rows drawn (without replacement) per tree
    subsample: f32,
    /// Fraction of features available to each tree
    colsample: f32,
    random_state: u64,
    init_prediction: f32,
    n_features: Option<usize>,
    estimators: Vec<RegressionTree>,
}

impl GradientBoostingClassifier {
    /// Creates a classifier with default parameters.
    ///
    /// # Default Parameters
    ///
    /// - `n_estimators`: 100
    /// - `learning_rate`: 0.1
    /// - `max_depth`: 5
    /// - `min_samples_split`: 10, `min_samples_leaf`: 5
    /// - `subsample`: 0.8, `colsample`: 0.8
    /// - `random_state`: 42
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            tree_params: TreeParams::default(),
            subsample: 0.8,
            colsample: 0.8,
            random_state: 42,
            init_prediction: 0.0,
            n_features: None,
            estimators: Vec::new(),
        }
    }

    /// Sets the number of boosting iterations (trees).
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Sets the learning rate (shrinkage parameter).
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the maximum depth of each tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.tree_params.max_depth = max_depth;
        self
    }

    /// Sets the row-subsample fraction in (0, 1].
    #[must_use]
    pub fn with_subsample(mut self, subsample: f32) -> Self {
        self.subsample = subsample.clamp(0.05, 1.0);
        self
    }

    /// Sets the column-subsample fraction in (0, 1].
    #[must_use]
    pub fn with_colsample(mut self, colsample: f32) -> Self {
        self.colsample = colsample.clamp(0.05, 1.0);
        self
    }

    /// Sets the RNG seed used for row/column subsampling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Trains the ensemble.
    ///
    /// # Arguments
    ///
    /// - `x`: Feature matrix (`n_samples` x `n_features`)
    /// - `y`: Binary labels (0 = pass, 1 = fail)
    ///
    /// # Errors
    ///
    /// Returns an error on empty input or mismatched sample counts.
    pub fn fit(&mut self, x: &Matrix, y: &[u8]) -> Result<()> {
        if x.n_rows() != y.len() {
            return Err("x and y must have the same number of samples".into());
        }
        if x.n_rows() == 0 {
            return Err("Cannot fit with 0 samples".into());
        }

        let n_samples = x.n_rows();
        let n_features = x.n_cols();
        self.n_features = Some(n_features);

        let y_float: Vec<f32> = y.iter().map(|&label| f32::from(label)).collect();

        // Initial prediction: log-odds, clamped for degenerate pools.
        let positive = y_float.iter().filter(|&&l| l == 1.0).count();
        let p = positive as f32 / n_samples as f32;
        self.init_prediction = if p > 0.0 && p < 1.0 {
            (p / (1.0 - p)).ln()
        } else if p >= 1.0 {
            5.0
        } else {
            -5.0
        };

        let mut raw = vec![self.init_prediction; n_samples];
        self.estimators = Vec::with_capacity(self.n_estimators);

        let mut rng = rand::rngs::StdRng::seed_from_u64(self.random_state);
        let n_rows_draw = ((n_samples as f32 * self.subsample) as usize).max(1);
        let n_cols_draw = ((n_features as f32 * self.colsample) as usize).max(1);

        for _ in 0..self.n_estimators {
            let residuals: Vec<f32> = y_float
                .iter()
                .zip(raw.iter())
                .map(|(&yi, &ri)| yi - sigmoid(ri))
                .collect();

            let mut rows: Vec<usize> = (0..n_samples).collect();
            rows.shuffle(&mut rng);
            rows.truncate(n_rows_draw);

            let mut features: Vec<usize> = (0..n_features).collect();
            features.shuffle(&mut rng);
            features.truncate(n_cols_draw);

            let mut tree = RegressionTree::new(self.tree_params);
            tree.fit(x, &residuals, &rows, &features)?;

            for (i, r) in raw.iter_mut().enumerate() {
                *r += self.learning_rate * tree.predict_one(x.row(i));
            }
            self.estimators.push(tree);
        }

        Ok(())
    }

    /// Raw (pre-sigmoid) prediction for a single sample.
    fn predict_raw(&self, sample: &[f32]) -> f32 {
        let mut raw = self.init_prediction;
        for tree in &self.estimators {
            raw += self.learning_rate * tree.predict_one(sample);
        }
        raw
    }

    /// Probability of the positive (failure) class for a single sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been trained.
    pub fn predict_proba_one(&self, sample: &[f32]) -> Result<f32> {
        if self.estimators.is_empty() {
            return Err("Model not trained yet".into());
        }
        Ok(sigmoid(self.predict_raw(sample)))
    }

    /// Positive-class probabilities for every row of `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been trained.
    pub fn predict_proba(&self, x: &Matrix) -> Result<Vec<f32>> {
        if self.estimators.is_empty() {
            return Err("Model not trained yet".into());
        }
        Ok((0..x.n_rows())
            .map(|i| sigmoid(self.predict_raw(x.row(i))))
            .collect())
    }

    /// Predicts binary labels (probability >= 0.5).
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been trained.
    pub fn predict(&self, x: &Matrix) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .iter()
            .map(|&p| u8::from(p >= 0.5))
            .collect())
    }

    /// Accuracy against true labels.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been trained.
    pub fn score(&self, x: &Matrix, y: &[u8]) -> Result<f32> {
        let predictions = self.predict(x)?;
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(pred, label)| pred == label)
            .count();
        Ok(correct as f32 / y.len().max(1) as f32)
    }

    /// Per-feature relative importances, normalized to sum to 1.0.
    ///
    /// Importance is the sample-weighted count of splits on each
    /// feature across the ensemble. Returns None before training.
    #[must_use]
    pub fn feature_importances(&self) -> Option<Vec<f32>> {
        let n_features = self.n_features?;
        if self.estimators.is_empty() {
            return None;
        }

        let mut importances = vec![0.0_f32; n_features];
        for tree in &self.estimators {
            tree.accumulate_importances(&mut importances);
        }

        let total: f32 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        Some(importances)
    }

    /// Returns the number of fitted estimators.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.estimators.len()
    }

    /// Returns the learning rate.
    #[must_use]
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// True once `fit` has produced an ensemble.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.estimators.is_empty()
    }
}

impl Default for GradientBoostingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

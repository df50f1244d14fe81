//! Probability calibration for the boosting ensemble.
//!
//! Raw ensemble scores are decisively shaped but not necessarily
//! well-calibrated. [`SigmoidCalibration`] fits Platt scaling on
//! held-out scores; [`CalibratedClassifier`] wraps k-fold
//! cross-validation so every calibration pair is fitted on scores the
//! underlying ensemble never trained on.

use crate::error::Result;
use crate::model_selection::KFold;
use crate::primitives::Matrix;
use crate::tree::gradient_boosting::sigmoid;
use crate::tree::GradientBoostingClassifier;
use serde::{Deserialize, Serialize};

/// Platt scaling: fits `p = sigmoid(a * score + b)` by gradient descent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigmoidCalibration {
    a: f32,
    b: f32,
}

impl Default for SigmoidCalibration {
    fn default() -> Self {
        Self::new()
    }
}

impl SigmoidCalibration {
    /// Creates an identity-like calibrator (a = 1, b = 0).
    #[must_use]
    pub fn new() -> Self {
        Self { a: 1.0, b: 0.0 }
    }

    /// Fits the sigmoid parameters on held-out (score, label) pairs.
    pub fn fit(&mut self, scores: &[f32], labels: &[u8]) {
        if scores.is_empty() {
            return;
        }

        let mut a = 1.0_f32;
        let mut b = 0.0_f32;
        let lr = 0.1;
        let n = scores.len() as f32;

        for _ in 0..2000 {
            let mut grad_a = 0.0;
            let mut grad_b = 0.0;

            for (&score, &label) in scores.iter().zip(labels.iter()) {
                let p = sigmoid(a * score + b);
                let diff = p - f32::from(label);
                grad_a += diff * score;
                grad_b += diff;
            }

            a -= lr * grad_a / n;
            b -= lr * grad_b / n;
        }

        self.a = a;
        self.b = b;
    }

    /// Calibrated probability for a raw score.
    #[must_use]
    pub fn predict_proba(&self, score: f32) -> f32 {
        sigmoid(self.a * score + self.b)
    }

    /// Fitted (a, b) parameters.
    #[must_use]
    pub fn params(&self) -> (f32, f32) {
        (self.a, self.b)
    }
}

/// Gradient-boosting ensemble with sigmoid calibration over k-fold CV.
///
/// For each fold, a fresh ensemble is fitted on the fold's training
/// part and a sigmoid on its held-out scores. Prediction averages the
/// calibrated probabilities of all fold pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibratedClassifier {
    base: GradientBoostingClassifier,
    n_splits: usize,
    random_state: u64,
    folds: Vec<(GradientBoostingClassifier, SigmoidCalibration)>,
}

impl CalibratedClassifier {
    /// Creates an unfitted calibrated classifier around a base
    /// (unfitted) ensemble configuration.
    #[must_use]
    pub fn new(base: GradientBoostingClassifier) -> Self {
        Self {
            base,
            n_splits: 5,
            random_state: 42,
            folds: Vec::new(),
        }
    }

    /// Sets the number of cross-validation folds (default 5).
    #[must_use]
    pub fn with_n_splits(mut self, n_splits: usize) -> Self {
        self.n_splits = n_splits.max(2);
        self
    }

    /// Sets the RNG seed for fold shuffling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Fits one (ensemble, sigmoid) pair per fold over the full pool.
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

        self.folds = Vec::with_capacity(self.n_splits);
        let kfold = KFold::new(self.n_splits).with_random_state(self.random_state);

        for (train_idx, test_idx) in kfold.split(x.n_rows()) {
            if train_idx.is_empty() || test_idx.is_empty() {
                continue;
            }

            let x_train = x.select_rows(&train_idx);
            let y_train: Vec<u8> = train_idx.iter().map(|&i| y[i]).collect();

            let mut ensemble = self.base.clone();
            ensemble.fit(&x_train, &y_train)?;

            let x_held = x.select_rows(&test_idx);
            let y_held: Vec<u8> = test_idx.iter().map(|&i| y[i]).collect();
            let held_scores = ensemble.predict_proba(&x_held)?;

            let mut calibrator = SigmoidCalibration::new();
            calibrator.fit(&held_scores, &y_held);

            self.folds.push((ensemble, calibrator));
        }

        if self.folds.is_empty() {
            return Err("Calibration produced no usable folds".into());
        }
        Ok(())
    }

    /// Calibrated positive-class probability for a single sample,
    /// averaged across fold pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the classifier has not been fitted.
    pub fn predict_proba_one(&self, sample: &[f32]) -> Result<f32> {
        if self.folds.is_empty() {
            return Err("Calibrated classifier not fitted yet".into());
        }

        let mut total = 0.0;
        for (ensemble, calibrator) in &self.folds {
            let score = ensemble.predict_proba_one(sample)?;
            total += calibrator.predict_proba(score);
        }
        Ok(total / self.folds.len() as f32)
    }

    /// True once `fit` has produced fold pairs.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.folds.is_empty()
    }

    /// Number of fitted fold pairs.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }
}

/// Brier score: mean squared error between predicted probabilities and
/// outcomes. Lower is better; perfect calibration scores 0.
#[must_use]
pub fn brier_score(predictions: &[f32], labels: &[u8]) -> f32 {
    if predictions.is_empty() {
        return 0.0;
    }
    predictions
        .iter()
        .zip(labels.iter())
        .map(|(&p, &l)| {
            let y = f32::from(l);
            (p - y) * (p - y)
        })
        .sum::<f32>()
        / predictions.len() as f32
}

#[cfg(test)]
#[path = "calibration_tests.rs"]
mod tests;

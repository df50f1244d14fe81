//! Calibrated failure-risk prediction.
//!
//! [`RiskPredictor`] wraps two ensembles: a raw gradient-boosting
//! classifier (kept for feature importances and accuracy reporting) and
//! a sigmoid-calibrated ensemble whose probabilities drive every
//! decision. Trained state lives in an immutable [`ModelSnapshot`]
//! published behind a read-write lock: readers clone the current `Arc`
//! and compute against a stable snapshot while `train`/`load` build a
//! complete replacement before swapping it in.

use crate::calibration::CalibratedClassifier;
use crate::error::{PreverError, Result};
use crate::features::{FeatureVector, NUM_SLOTS, SLOT_NAMES};
use crate::model_selection::train_test_split_stratified;
use crate::primitives::Matrix;
use crate::tree::GradientBoostingClassifier;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Discretized risk label derived from the failure probability.
///
/// Presentation only: downstream logic compares raw probabilities,
/// never these labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Failure probability below 0.40
    Low,
    /// Failure probability in [0.40, 0.70)
    Medium,
    /// Failure probability at or above 0.70
    High,
}

impl RiskLevel {
    /// Maps a probability onto the fixed three-way partition.
    #[must_use]
    pub fn from_probability(p: f32) -> Self {
        if p >= 0.70 {
            RiskLevel::High
        } else if p >= 0.40 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Outcome of a single risk assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Calibrated P(failure) in [0, 1]
    pub failure_probability: f32,
    /// Decisiveness of the estimate: |p - 0.5| * 2. Maximal at the
    /// extremes, zero at p = 0.5. Measures decisiveness, not accuracy.
    pub confidence: f32,
    /// Discretized label for presentation
    pub risk_level: RiskLevel,
    /// Binary decision: 1 iff p >= 0.5
    pub prediction: u8,
}

impl PredictionResult {
    /// Derives the full result from a failure probability. Everything
    /// here is a function of `p`; there is no independent state.
    #[must_use]
    pub fn from_probability(p: f32) -> Self {
        Self {
            failure_probability: p,
            confidence: (p - 0.5).abs() * 2.0,
            risk_level: RiskLevel::from_probability(p),
            prediction: u8::from(p >= 0.5),
        }
    }
}

/// Metrics reported by a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Raw-ensemble accuracy on the training split
    pub train_accuracy: f32,
    /// Raw-ensemble accuracy on the validation split
    pub val_accuracy: f32,
    /// Total number of samples in the pool
    pub n_samples: usize,
    /// Feature dimensionality
    pub n_features: usize,
}

/// Immutable trained-model pair: published whole, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    ensemble: GradientBoostingClassifier,
    calibrated: CalibratedClassifier,
}

/// Probabilistic failure-risk model.
///
/// Safe for concurrent `predict` calls: readers share the published
/// snapshot while `train`/`load` serialize through the write lock.
#[derive(Debug)]
pub struct RiskPredictor {
    base: GradientBoostingClassifier,
    snapshot: RwLock<Option<Arc<ModelSnapshot>>>,
}

impl Default for RiskPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskPredictor {
    /// Creates an untrained predictor with the default ensemble
    /// configuration (100 trees, learning rate 0.1, depth 5).
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: GradientBoostingClassifier::new(),
            snapshot: RwLock::new(None),
        }
    }

    /// Creates an untrained predictor around a custom (unfitted)
    /// ensemble configuration.
    #[must_use]
    pub fn with_base(base: GradientBoostingClassifier) -> Self {
        Self {
            base,
            snapshot: RwLock::new(None),
        }
    }

    /// Trains both ensembles and publishes a new snapshot.
    ///
    /// The raw ensemble fits an 80/20 stratified split; the calibrated
    /// ensemble fits sigmoid calibration over 5-fold cross-validation
    /// on the full pool.
    ///
    /// # Errors
    ///
    /// Returns an error on empty or mismatched training data.
    pub fn train(&self, x: &Matrix, y: &[u8]) -> Result<TrainingReport> {
        if x.n_rows() != y.len() {
            return Err(PreverError::DimensionMismatch {
                expected: format!("{} labels", x.n_rows()),
                actual: format!("{} labels", y.len()),
            });
        }
        if x.n_rows() == 0 {
            return Err("Cannot train with 0 samples".into());
        }

        let (train_idx, val_idx) = train_test_split_stratified(y, 0.2, 42);

        let x_train = x.select_rows(&train_idx);
        let y_train: Vec<u8> = train_idx.iter().map(|&i| y[i]).collect();
        let x_val = x.select_rows(&val_idx);
        let y_val: Vec<u8> = val_idx.iter().map(|&i| y[i]).collect();

        let mut ensemble = self.base.clone();
        ensemble.fit(&x_train, &y_train)?;

        let train_accuracy = ensemble.score(&x_train, &y_train)?;
        let val_accuracy = if y_val.is_empty() {
            train_accuracy
        } else {
            ensemble.score(&x_val, &y_val)?
        };

        // Calibration pool = train + validation, matching the raw
        // ensemble's configuration.
        let mut calibrated = CalibratedClassifier::new(self.base.clone());
        calibrated.fit(x, y)?;

        let report = TrainingReport {
            train_accuracy,
            val_accuracy,
            n_samples: x.n_rows(),
            n_features: x.n_cols(),
        };

        self.publish(ModelSnapshot {
            ensemble,
            calibrated,
        });
        Ok(report)
    }

    /// Predicts failure risk for one feature vector.
    ///
    /// # Errors
    ///
    /// Returns [`PreverError::NotTrained`] before any train/load.
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult> {
        let snapshot = self.current()?;
        let p = snapshot.calibrated.predict_proba_one(features.as_slice())?;
        Ok(PredictionResult::from_probability(p))
    }

    /// Element-wise [`Self::predict`] over a batch.
    ///
    /// # Errors
    ///
    /// Returns [`PreverError::NotTrained`] before any train/load.
    pub fn predict_batch(&self, batch: &[FeatureVector]) -> Result<Vec<PredictionResult>> {
        let snapshot = self.current()?;
        batch
            .iter()
            .map(|features| {
                let p = snapshot.calibrated.predict_proba_one(features.as_slice())?;
                Ok(PredictionResult::from_probability(p))
            })
            .collect()
    }

    /// Slot-name-keyed relative importances from the raw ensemble,
    /// sorted descending. Used for explanation ranking only.
    ///
    /// # Errors
    ///
    /// Returns [`PreverError::NotTrained`] before any train/load.
    pub fn feature_importance(&self) -> Result<Vec<(String, f32)>> {
        let snapshot = self.current()?;
        let importances = snapshot
            .ensemble
            .feature_importances()
            .ok_or(PreverError::NotTrained)?;

        let mut named: Vec<(String, f32)> = importances
            .into_iter()
            .take(NUM_SLOTS)
            .enumerate()
            .map(|(idx, imp)| (SLOT_NAMES[idx].to_string(), imp))
            .collect();
        named.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(named)
    }

    /// Persists the current snapshot to the model store.
    ///
    /// # Errors
    ///
    /// Returns [`PreverError::NotTrained`] when nothing is published,
    /// or an I/O/serialization error.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let snapshot = self.current()?;
        let bytes = bincode::serialize(snapshot.as_ref())
            .map_err(|e| PreverError::Serialization(e.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Restores a snapshot from the model store and publishes it.
    ///
    /// # Errors
    ///
    /// Returns [`PreverError::ModelNotFound`] when the store is absent,
    /// or a deserialization error on a corrupt blob.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PreverError::ModelNotFound {
                path: path.display().to_string(),
            });
        }
        let bytes = std::fs::read(path)?;
        let snapshot: ModelSnapshot = bincode::deserialize(&bytes)
            .map_err(|e| PreverError::Serialization(e.to_string()))?;
        self.publish(snapshot);
        Ok(())
    }

    /// True once a snapshot is published.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.snapshot
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Clones out the current snapshot handle.
    fn current(&self) -> Result<Arc<ModelSnapshot>> {
        self.snapshot
            .read()
            .map_err(|_| PreverError::Other("snapshot lock poisoned".to_string()))?
            .clone()
            .ok_or(PreverError::NotTrained)
    }

    /// Atomically replaces the published snapshot.
    fn publish(&self, snapshot: ModelSnapshot) {
        if let Ok(mut guard) = self.snapshot.write() {
            *guard = Some(Arc::new(snapshot));
        }
    }
}

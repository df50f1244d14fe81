//! Cross-validation and train/test splitting utilities.

use rand::seq::SliceRandom;
use rand::SeedableRng;

/// K-Fold cross-validator.
///
/// Provides train/test index pairs splitting the sample range into K
/// consecutive folds. The calibration layer uses this to fit one
/// (ensemble, sigmoid) pair per fold.
///
/// # Example
///
/// ```
/// use prever::model_selection::KFold;
///
/// let kfold = KFold::new(5);
/// let folds = kfold.split(10);
/// assert_eq!(folds.len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl KFold {
    /// Create a new K-Fold cross-validator.
    ///
    /// # Arguments
    ///
    /// * `n_splits` - Number of folds. Must be at least 2.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            random_state: None,
        }
    }

    /// Set random state for reproducible shuffling (implies shuffle).
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self.shuffle = true;
        self
    }

    /// Generate train/test indices for each fold.
    ///
    /// Returns a vector of (train_indices, test_indices) tuples.
    #[must_use]
    pub fn split(&self, n_samples: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
        let mut indices: Vec<usize> = (0..n_samples).collect();

        if self.shuffle {
            if let Some(seed) = self.random_state {
                let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
                indices.shuffle(&mut rng);
            } else {
                let mut rng = rand::thread_rng();
                indices.shuffle(&mut rng);
            }
        }

        let fold_size = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut result = Vec::with_capacity(self.n_splits);
        let mut start = 0;

        for i in 0..self.n_splits {
            let current_fold_size = if i < remainder {
                fold_size + 1
            } else {
                fold_size
            };
            let end = start + current_fold_size;

            let test_indices: Vec<usize> = indices[start..end].to_vec();
            let mut train_indices = Vec::with_capacity(n_samples - current_fold_size);
            train_indices.extend_from_slice(&indices[..start]);
            train_indices.extend_from_slice(&indices[end..]);

            result.push((train_indices, test_indices));
            start = end;
        }

        result
    }
}

/// Splits sample indices into train and test sets, stratified by label.
///
/// Each label's samples are shuffled independently (seeded) and split at
/// the same ratio, so the test set preserves the class balance of the
/// pool. `test_size` is a fraction in (0, 1).
#[must_use]
pub fn train_test_split_stratified(
    labels: &[u8],
    test_size: f32,
    random_state: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(random_state);

    let mut by_label: std::collections::BTreeMap<u8, Vec<usize>> =
        std::collections::BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        by_label.entry(label).or_default().push(idx);
    }

    let mut train = Vec::new();
    let mut test = Vec::new();

    for (_, mut indices) in by_label {
        indices.shuffle(&mut rng);
        let n_test = ((indices.len() as f32) * test_size).round() as usize;
        let n_test = n_test.min(indices.len());
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

//! Cross-validation splitters

use crate::error::{Result, StudioError};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Cross-validation strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CVStrategy {
    /// K-Fold cross-validation
    KFold { n_splits: usize, shuffle: bool },
    /// Stratified K-Fold (maintains class distribution)
    StratifiedKFold { n_splits: usize, shuffle: bool },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::StratifiedKFold { n_splits: 5, shuffle: true }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Generate train/test splits. `y` holds class indices for stratification.
    pub fn split(&self, n_samples: usize, y: Option<&Array1<f64>>) -> Result<Vec<CVSplit>> {
        match &self.strategy {
            CVStrategy::KFold { n_splits, shuffle } => self.k_fold_split(n_samples, *n_splits, *shuffle),
            CVStrategy::StratifiedKFold { n_splits, shuffle } => {
                let y = y.ok_or_else(|| {
                    StudioError::ValidationError("StratifiedKFold requires target array".to_string())
                })?;
                self.stratified_k_fold_split(y, *n_splits, *shuffle)
            }
        }
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn check_splits(n_samples: usize, n_splits: usize) -> Result<()> {
        if n_splits < 2 {
            return Err(StudioError::ValidationError("n_splits must be at least 2".to_string()));
        }
        if n_samples < n_splits {
            return Err(StudioError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }
        Ok(())
    }

    fn k_fold_split(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Result<Vec<CVSplit>> {
        Self::check_splits(n_samples, n_splits)?;

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if shuffle {
            indices.shuffle(&mut self.rng());
        }

        let fold_of: Vec<usize> = {
            let mut fold_of = vec![0; n_samples];
            let mut current = 0;
            for fold_idx in 0..n_splits {
                let size = n_samples / n_splits + usize::from(fold_idx < n_samples % n_splits);
                for &i in &indices[current..current + size] {
                    fold_of[i] = fold_idx;
                }
                current += size;
            }
            fold_of
        };

        Ok(Self::assemble(&fold_of, n_splits))
    }

    fn stratified_k_fold_split(&self, y: &Array1<f64>, n_splits: usize, shuffle: bool) -> Result<Vec<CVSplit>> {
        let n_samples = y.len();
        Self::check_splits(n_samples, n_splits)?;

        let n_classes = y.iter().map(|&v| v as usize + 1).max().unwrap_or(0);
        let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
        for (i, &label) in y.iter().enumerate() {
            by_class[label as usize].push(i);
        }

        let mut rng = self.rng();
        let mut fold_of = vec![0; n_samples];
        // Deal each class round-robin so every fold sees every class; the
        // offset keeps fold sizes balanced across classes.
        let mut offset = 0;
        for members in &mut by_class {
            if shuffle {
                members.shuffle(&mut rng);
            }
            for (pos, &i) in members.iter().enumerate() {
                fold_of[i] = (offset + pos) % n_splits;
            }
            offset += members.len();
        }

        Ok(Self::assemble(&fold_of, n_splits))
    }

    fn assemble(fold_of: &[usize], n_splits: usize) -> Vec<CVSplit> {
        (0..n_splits)
            .map(|fold_idx| {
                let (test_indices, train_indices): (Vec<usize>, Vec<usize>) =
                    (0..fold_of.len()).partition(|&i| fold_of[i] == fold_idx);
                CVSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_k_fold_covers_every_sample_once() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 3, shuffle: true }).with_random_state(1);
        let splits = cv.split(10, None).unwrap();

        assert_eq!(splits.len(), 3);
        let mut seen: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        seen.sort();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        for split in &splits {
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 10);
        }
    }

    #[test]
    fn test_stratified_folds_keep_classes() {
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0];
        let cv = CrossValidator::new(CVStrategy::StratifiedKFold { n_splits: 2, shuffle: true }).with_random_state(3);
        let splits = cv.split(y.len(), Some(&y)).unwrap();

        for split in &splits {
            let classes: Vec<usize> = split.test_indices.iter().map(|&i| y[i] as usize).collect();
            assert_eq!(classes.iter().filter(|&&c| c == 0).count(), 2);
            assert_eq!(classes.iter().filter(|&&c| c == 1).count(), 2);
            assert_eq!(classes.iter().filter(|&&c| c == 2).count(), 1);
        }
    }

    #[test]
    fn test_too_few_splits() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 1, shuffle: false });
        assert!(cv.split(10, None).is_err());
    }
}

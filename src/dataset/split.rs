//! Shuffled train/test partitioning

use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Result, StudioError};

/// Train and held-out partitions of one frame
#[derive(Debug, Clone)]
pub struct Partitions {
    pub train: DataFrame,
    pub test: DataFrame,
}

/// Shuffle the rows of `df` and cut them into train and test partitions.
///
/// `train_size` is the fraction of rows kept for training (floored). Without a
/// `seed` the shuffle draws from OS entropy, so partitions differ between calls.
pub fn train_test_split(df: &DataFrame, train_size: f64, seed: Option<u64>) -> Result<Partitions> {
    if !(train_size > 0.0 && train_size < 1.0) {
        return Err(StudioError::InvalidInput(format!(
            "train_size must be in (0, 1), got {}",
            train_size
        )));
    }

    let n = df.height();
    let n_train = (n as f64 * train_size).floor() as usize;
    if n_train == 0 || n_train == n {
        return Err(StudioError::ValidationError(format!(
            "Cannot split {} rows with train_size {}",
            n, train_size
        )));
    }

    let mut indices: Vec<IdxSize> = (0..n as IdxSize).collect();
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    indices.shuffle(&mut rng);

    let test_indices = indices.split_off(n_train);
    let train = df.take(&IdxCa::from_vec("idx".into(), indices))?;
    let test = df.take(&IdxCa::from_vec("idx".into(), test_indices))?;

    Ok(Partitions { train, test })
}

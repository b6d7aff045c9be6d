//! K-Nearest Neighbors classifier
//!
//! Features are standardized with the training mean and deviation before
//! distances are computed, so columns on large scales do not dominate.

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{Result, StudioError};

/// Weighting scheme for neighbors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum WeightScheme {
    /// All neighbors have equal weight
    #[default]
    Uniform,
    /// Closer neighbors have more weight (inverse distance)
    Distance,
}

/// KNN configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNConfig {
    /// Number of neighbors
    pub n_neighbors: usize,
    /// Weighting scheme
    pub weights: WeightScheme,
}

impl Default for KNNConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            weights: WeightScheme::Uniform,
        }
    }
}

/// K-Nearest Neighbors Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNClassifier {
    config: KNNConfig,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
    n_classes: usize,
}

impl KNNClassifier {
    pub fn new(config: KNNConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: None,
            mean: None,
            scale: None,
            n_classes: 0,
        }
    }

    /// Fit the classifier (stores the standardized training set)
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, n_classes: usize) -> Result<()> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(StudioError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let mean = x.mean_axis(Axis(0)).ok_or(StudioError::ModelNotFitted)?;
        let scale = x.std_axis(Axis(0), 0.0).mapv(|s| if s > 1e-12 { s } else { 1.0 });

        self.x_train = Some((x - &mean) / &scale);
        self.y_train = Some(y.clone());
        self.mean = Some(mean);
        self.scale = Some(scale);
        self.n_classes = n_classes;
        Ok(())
    }

    /// Class probabilities from (weighted) neighbor votes
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (x_train, y_train, mean, scale) = match (&self.x_train, &self.y_train, &self.mean, &self.scale) {
            (Some(xt), Some(yt), Some(m), Some(s)) => (xt, yt, m, s),
            _ => return Err(StudioError::ModelNotFitted),
        };

        if x.ncols() != x_train.ncols() {
            return Err(StudioError::ShapeError {
                expected: format!("{} features", x_train.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let x = (x - mean) / scale;
        let k = self.config.n_neighbors.clamp(1, x_train.nrows());
        let n_classes = self.n_classes;

        let rows: Vec<Vec<f64>> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let query = x.row(i);
                let mut distances: Vec<(f64, usize)> = x_train
                    .rows()
                    .into_iter()
                    .enumerate()
                    .map(|(j, train_row)| {
                        let d = query
                            .iter()
                            .zip(train_row.iter())
                            .map(|(a, b)| (a - b).powi(2))
                            .sum::<f64>()
                            .sqrt();
                        (d, j)
                    })
                    .collect();
                distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

                let mut votes = vec![0.0; n_classes];
                for &(d, j) in distances.iter().take(k) {
                    let weight = match self.config.weights {
                        WeightScheme::Uniform => 1.0,
                        WeightScheme::Distance => 1.0 / (d + 1e-10),
                    };
                    votes[y_train[j] as usize] += weight;
                }
                let total: f64 = votes.iter().sum();
                votes.iter().map(|v| v / total).collect()
            })
            .collect();

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((x.nrows(), n_classes), flat)?)
    }

    /// Predicted class index per sample
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(super::argmax_rows(&self.predict_proba(x)?))
    }
}

//! Gaussian Naive Bayes classifier

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{Result, StudioError};

/// Gaussian Naive Bayes Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Mean of each feature, per class
    means: Vec<Vec<f64>>,
    /// Variance of each feature, per class
    variances: Vec<Vec<f64>>,
    /// Prior probability of each class
    priors: Vec<f64>,
    /// Smoothing added to every variance, relative to the largest feature variance
    var_smoothing: f64,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self {
            means: Vec::new(),
            variances: Vec::new(),
            priors: Vec::new(),
            var_smoothing: 1e-9,
        }
    }

    /// Set variance smoothing parameter
    pub fn with_var_smoothing(mut self, smoothing: f64) -> Self {
        self.var_smoothing = smoothing;
        self
    }

    /// Fit the classifier
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, n_classes: usize) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples == 0 || n_samples != y.len() {
            return Err(StudioError::ShapeError {
                expected: format!("{} labels", n_samples),
                actual: format!("{} labels", y.len()),
            });
        }

        // Largest feature variance scales the smoothing term.
        let max_var = x
            .columns()
            .into_iter()
            .map(|col| col.var(0.0))
            .fold(0.0f64, f64::max);
        let epsilon = self.var_smoothing * max_var.max(f64::MIN_POSITIVE);

        self.means = vec![vec![0.0; n_features]; n_classes];
        self.variances = vec![vec![0.0; n_features]; n_classes];
        self.priors = vec![0.0; n_classes];

        // Single-pass Welford's algorithm for mean and variance
        let mut counts = vec![0usize; n_classes];
        let mut m2 = vec![vec![0.0; n_features]; n_classes];
        for (row, &label) in x.rows().into_iter().zip(y.iter()) {
            let class = label as usize;
            counts[class] += 1;
            let n = counts[class] as f64;
            for (j, &val) in row.iter().enumerate() {
                let delta = val - self.means[class][j];
                self.means[class][j] += delta / n;
                let delta2 = val - self.means[class][j];
                m2[class][j] += delta * delta2;
            }
        }

        for class in 0..n_classes {
            let n = counts[class];
            self.priors[class] = n as f64 / n_samples as f64;
            for j in 0..n_features {
                self.variances[class][j] = (if n > 0 { m2[class][j] / n as f64 } else { 0.0 }) + epsilon;
            }
        }

        Ok(())
    }

    /// Predict class probabilities
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.priors.is_empty() {
            return Err(StudioError::ModelNotFitted);
        }

        let n_classes = self.priors.len();
        let mut log_probs = Array2::from_elem((x.nrows(), n_classes), f64::NEG_INFINITY);

        for (i, row) in x.rows().into_iter().enumerate() {
            for class in 0..n_classes {
                if self.priors[class] == 0.0 {
                    continue;
                }
                let log_likelihood: f64 = row
                    .iter()
                    .zip(&self.means[class])
                    .zip(&self.variances[class])
                    .map(|((&xi, &mean), &var)| -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln()))
                    .sum();
                log_probs[[i, class]] = self.priors[class].ln() + log_likelihood;
            }
        }

        // Normalize (log-sum-exp trick)
        for mut row in log_probs.rows_mut() {
            let max_val = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let sum: f64 = row.iter().map(|&v| (v - max_val).exp()).sum();
            row.mapv_inplace(|v| (v - max_val).exp() / sum);
        }

        Ok(log_probs)
    }

    /// Predict class indices
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(super::argmax_rows(&self.predict_proba(x)?))
    }

    /// Class priors
    pub fn class_priors(&self) -> &[f64] {
        &self.priors
    }
}

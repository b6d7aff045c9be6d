//! Classification metrics

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Metrics for a multiclass classifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean over classes of (1 - recall of that class)
    pub mean_per_class_error: f64,
    /// Fraction of correct predictions
    pub accuracy: f64,
    /// Multiclass log loss
    pub logloss: f64,
    /// Number of scored samples
    pub n_samples: usize,
}

impl ModelMetrics {
    /// Score class probabilities against true class indices
    pub fn compute(y_true: &Array1<f64>, proba: &Array2<f64>) -> Self {
        let y_pred = super::argmax_rows(proba);
        let n_classes = proba.ncols();
        let n = y_true.len();

        let correct = y_true.iter().zip(y_pred.iter()).filter(|(t, p)| t == p).count();

        let logloss = if n > 0 {
            -y_true
                .iter()
                .enumerate()
                .map(|(i, &t)| proba[[i, t as usize]].clamp(1e-15, 1.0).ln())
                .sum::<f64>()
                / n as f64
        } else {
            0.0
        };

        Self {
            mean_per_class_error: mean_per_class_error(y_true, &y_pred, n_classes),
            accuracy: if n > 0 { correct as f64 / n as f64 } else { 0.0 },
            logloss,
            n_samples: n,
        }
    }
}

/// Average of the per-class error rates over the classes present in `y_true`.
pub fn mean_per_class_error(y_true: &Array1<f64>, y_pred: &Array1<f64>, n_classes: usize) -> f64 {
    let mut totals = vec![0usize; n_classes];
    let mut errors = vec![0usize; n_classes];

    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        let class = t as usize;
        totals[class] += 1;
        if t != p {
            errors[class] += 1;
        }
    }

    let rates: Vec<f64> = totals
        .iter()
        .zip(&errors)
        .filter(|(total, _)| **total > 0)
        .map(|(&total, &err)| err as f64 / total as f64)
        .collect();

    if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    }
}

/// Accuracy shown to users: `100 - mean_per_class_error * 100`, two decimals.
pub fn accuracy_percent(mean_per_class_error: f64) -> f64 {
    ((100.0 - mean_per_class_error * 100.0) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mean_per_class_error() {
        // class 0: 1 of 2 wrong, class 1: 0 of 2 wrong, class 2: 1 of 1 wrong
        let y_true = array![0.0, 0.0, 1.0, 1.0, 2.0];
        let y_pred = array![0.0, 1.0, 1.0, 1.0, 0.0];
        let mpce = mean_per_class_error(&y_true, &y_pred, 3);
        assert!((mpce - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_absent_classes_are_ignored() {
        let y_true = array![0.0, 0.0];
        let y_pred = array![0.0, 1.0];
        assert!((mean_per_class_error(&y_true, &y_pred, 3) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_accuracy_percent_rounding() {
        assert_eq!(accuracy_percent(0.0), 100.0);
        assert_eq!(accuracy_percent(1.0 / 3.0), 66.67);
        assert_eq!(accuracy_percent(0.012345), 98.77);
    }

    #[test]
    fn test_compute_from_proba() {
        let y_true = array![0.0, 1.0];
        let proba = array![[0.9, 0.1], [0.2, 0.8]];
        let metrics = ModelMetrics::compute(&y_true, &proba);
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.mean_per_class_error, 0.0);
        assert!(metrics.logloss > 0.0);
    }
}

//! Model training module
//!
//! Provides the classifiers searched by the AutoML engine:
//! - Gaussian Naive Bayes
//! - K-Nearest Neighbors
//! - Decision trees and Random Forests
//!
//! plus stratified cross-validation, classification metrics and the
//! [`build_model`] entry point that ranks candidates on a leaderboard.

mod engine;
pub mod cross_validation;
pub mod decision_tree;
pub mod estimator;
pub mod knn;
pub mod metrics;
pub mod naive_bayes;
pub mod random_forest;

pub use engine::{build_model, AutoMlConfig, AutoMlModel, LeaderboardEntry, Prediction};
pub use cross_validation::{CrossValidator, CVStrategy, CVSplit};
pub use decision_tree::{DecisionTree, TreeNode, Criterion};
pub use estimator::{Estimator, ModelType};
pub use knn::{KNNClassifier, KNNConfig, WeightScheme};
pub use metrics::{accuracy_percent, mean_per_class_error, ModelMetrics};
pub use naive_bayes::GaussianNaiveBayes;
pub use random_forest::{RandomForest, MaxFeatures};

use ndarray::{Array1, Array2};

/// Index of the largest probability in each row, as `f64` class labels.
pub(crate) fn argmax_rows(proba: &Array2<f64>) -> Array1<f64> {
    proba
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0usize, f64::NEG_INFINITY), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
                .0 as f64
        })
        .collect()
}

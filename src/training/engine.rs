//! AutoML engine
//!
//! Searches the candidate families with stratified k-fold cross-validation
//! under a wall-clock budget, ranks them on mean per-class error and refits
//! the leader on the full training frame.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, StudioError};
use super::cross_validation::{CVSplit, CVStrategy, CrossValidator};
use super::estimator::{candidates, Candidate, Estimator, ModelType};
use super::metrics::{accuracy_percent, ModelMetrics};

/// AutoML run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoMlConfig {
    /// Label column
    pub target_column: String,
    /// Families to search
    pub model_type: ModelType,
    /// Wall-clock budget; the first candidate always runs
    pub max_runtime_secs: f64,
    /// Cross-validation folds
    pub nfolds: usize,
    /// Seed for folds and tree sampling
    pub seed: Option<u64>,
}

impl Default for AutoMlConfig {
    fn default() -> Self {
        Self {
            target_column: "target".to_string(),
            model_type: ModelType::Auto,
            max_runtime_secs: 5.0,
            nfolds: 2,
            seed: None,
        }
    }
}

impl AutoMlConfig {
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            ..Default::default()
        }
    }

    pub fn with_model_type(mut self, model_type: ModelType) -> Self {
        self.model_type = model_type;
        self
    }

    pub fn with_max_runtime_secs(mut self, secs: f64) -> Self {
        self.max_runtime_secs = secs;
        self
    }

    pub fn with_nfolds(mut self, nfolds: usize) -> Self {
        self.nfolds = nfolds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One ranked candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub model_id: String,
    pub mean_per_class_error: f64,
    pub logloss: f64,
    pub accuracy: f64,
    pub training_time_secs: f64,
}

/// A single prediction: the winning label and the probability of every class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub probabilities: Vec<f64>,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let probs: Vec<String> = self.probabilities.iter().map(|p| format!("{:.4}", p)).collect();
        write!(f, "{} ({})", self.label, probs.join(", "))
    }
}

/// Trained AutoML leader plus what is needed to score new frames
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoMlModel {
    model_id: String,
    target_column: String,
    feature_names: Vec<String>,
    classes: Vec<String>,
    estimator: Estimator,
    metrics: ModelMetrics,
    leaderboard: Vec<LeaderboardEntry>,
    trained_at: String,
}

impl AutoMlModel {
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    /// Cross-validated metrics of the leader
    pub fn metrics(&self) -> &ModelMetrics {
        &self.metrics
    }

    pub fn mean_per_class_error(&self) -> f64 {
        self.metrics.mean_per_class_error
    }

    /// `round(100 - mean_per_class_error * 100, 2)`
    pub fn accuracy_percent(&self) -> f64 {
        accuracy_percent(self.metrics.mean_per_class_error)
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    pub fn trained_at(&self) -> &str {
        &self.trained_at
    }

    /// Score every row of `df`. Columns the model was not trained on are ignored.
    pub fn predict(&self, df: &DataFrame) -> Result<Vec<Prediction>> {
        let x = columns_to_array2(df, &self.feature_names)?;
        let proba = self
            .estimator
            .predict_proba(&x)
            .map_err(|e| StudioError::InferenceError(e.to_string()))?;

        let predictions = proba
            .rows()
            .into_iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                Prediction {
                    label: self.classes[best].clone(),
                    probabilities: row.to_vec(),
                }
            })
            .collect();

        Ok(predictions)
    }
}

/// Run the AutoML search on `train_df` and return the refit leader.
///
/// Model ids read `<Family>_<n>_AutoML_<run>_<YYYYMMDD_HHMMSS>`, where `<run>`
/// is a random token shared by every candidate of one search.
pub fn build_model(train_df: &DataFrame, config: &AutoMlConfig) -> Result<AutoMlModel> {
    let start = Instant::now();
    let budget = Duration::from_secs_f64(config.max_runtime_secs.max(0.0));

    if config.nfolds < 2 {
        return Err(StudioError::InvalidInput(format!("nfolds must be at least 2, got {}", config.nfolds)));
    }

    let feature_names = feature_columns(train_df, &config.target_column);
    if feature_names.is_empty() {
        return Err(StudioError::ValidationError("No feature columns besides the target".to_string()));
    }
    let (classes, y) = encode_target(train_df, &config.target_column)?;
    if classes.len() < 2 {
        return Err(StudioError::TrainingError(format!(
            "Target '{}' needs at least two classes, found {}",
            config.target_column,
            classes.len()
        )));
    }
    let x = columns_to_array2(train_df, &feature_names)?;
    let n_classes = classes.len();

    let mut validator = CrossValidator::new(CVStrategy::StratifiedKFold {
        n_splits: config.nfolds,
        shuffle: true,
    });
    if let Some(seed) = config.seed {
        validator = validator.with_random_state(seed);
    }
    let folds = validator.split(x.nrows(), Some(&y))?;

    // The run token keeps ids distinct across runs that start in the same second.
    let run_stamp = format!(
        "{}_{}",
        &uuid::Uuid::new_v4().simple().to_string()[..8],
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    let mut family_counts: HashMap<&'static str, usize> = HashMap::new();
    let mut scored: Vec<(LeaderboardEntry, Candidate)> = Vec::new();

    info!(
        rows = x.nrows(),
        features = feature_names.len(),
        classes = n_classes,
        nfolds = config.nfolds,
        max_runtime_secs = config.max_runtime_secs,
        "Starting AutoML search"
    );

    for (i, candidate) in candidates(config.model_type).into_iter().enumerate() {
        if i > 0 && start.elapsed() >= budget {
            info!(trained = scored.len(), "Runtime budget exhausted, stopping search");
            break;
        }

        let family = candidate.build(None).family();
        let n = family_counts.entry(family).or_insert(0);
        *n += 1;
        let model_id = format!("{}_{}_AutoML_{}", family, n, run_stamp);

        let fit_start = Instant::now();
        let seed = config.seed.map(|s| s.wrapping_add(i as u64));
        match cross_validate(&candidate, &x, &y, n_classes, &folds, seed) {
            Ok(proba) => {
                let metrics = ModelMetrics::compute(&y, &proba);
                debug!(
                    model_id = %model_id,
                    mean_per_class_error = metrics.mean_per_class_error,
                    logloss = metrics.logloss,
                    "Candidate scored"
                );
                scored.push((
                    LeaderboardEntry {
                        model_id,
                        mean_per_class_error: metrics.mean_per_class_error,
                        logloss: metrics.logloss,
                        accuracy: metrics.accuracy,
                        training_time_secs: fit_start.elapsed().as_secs_f64(),
                    },
                    candidate,
                ));
            }
            Err(e) => warn!(model_id = %model_id, error = %e, "Candidate failed, skipping"),
        }
    }

    scored.sort_by(|a, b| {
        a.0.mean_per_class_error
            .partial_cmp(&b.0.mean_per_class_error)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.logloss.partial_cmp(&b.0.logloss).unwrap_or(std::cmp::Ordering::Equal))
    });

    let (leader, leader_candidate) = scored
        .first()
        .cloned()
        .ok_or_else(|| StudioError::TrainingError("Every candidate model failed".to_string()))?;

    let mut estimator = leader_candidate.build(config.seed);
    estimator.fit(&x, &y, n_classes)?;

    let metrics = ModelMetrics {
        mean_per_class_error: leader.mean_per_class_error,
        accuracy: leader.accuracy,
        logloss: leader.logloss,
        n_samples: x.nrows(),
    };

    info!(
        model_id = %leader.model_id,
        mean_per_class_error = leader.mean_per_class_error,
        candidates = scored.len(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        "AutoML search finished"
    );

    Ok(AutoMlModel {
        model_id: leader.model_id.clone(),
        target_column: config.target_column.clone(),
        feature_names,
        classes,
        estimator,
        metrics,
        leaderboard: scored.into_iter().map(|(entry, _)| entry).collect(),
        trained_at: chrono::Utc::now().to_rfc3339(),
    })
}

/// Pooled out-of-fold class probabilities for one candidate
fn cross_validate(
    candidate: &Candidate,
    x: &Array2<f64>,
    y: &Array1<f64>,
    n_classes: usize,
    folds: &[CVSplit],
    seed: Option<u64>,
) -> Result<Array2<f64>> {
    let mut oof = Array2::zeros((x.nrows(), n_classes));

    for fold in folds {
        let x_train = x.select(ndarray::Axis(0), &fold.train_indices);
        let y_train = y.select(ndarray::Axis(0), &fold.train_indices);
        let x_test = x.select(ndarray::Axis(0), &fold.test_indices);

        let mut estimator = candidate.build(seed.map(|s| s.wrapping_add(fold.fold_idx as u64)));
        estimator.fit(&x_train, &y_train, n_classes)?;
        let proba = estimator.predict_proba(&x_test)?;

        for (row, &i) in proba.rows().into_iter().zip(&fold.test_indices) {
            oof.row_mut(i).assign(&row);
        }
    }

    Ok(oof)
}

fn feature_columns(df: &DataFrame, target: &str) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != target)
        .map(|s| s.to_string())
        .collect()
}

/// Sorted class labels and the class index of every row
fn encode_target(df: &DataFrame, target: &str) -> Result<(Vec<String>, Array1<f64>)> {
    let labels: Vec<String> = df
        .column(target)
        .map_err(|_| StudioError::FeatureNotFound(target.to_string()))?
        .cast(&DataType::String)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| {
            v.map(|s| s.to_string())
                .ok_or_else(|| StudioError::DataError(format!("Null value in target column '{}'", target)))
        })
        .collect::<Result<_>>()?;

    let mut classes = labels.clone();
    classes.sort_by(|a, b| match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.cmp(b),
    });
    classes.dedup();

    let index: HashMap<&str, usize> = classes.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();
    let y = labels.iter().map(|l| index[l.as_str()] as f64).collect();

    Ok((classes, y))
}

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| StudioError::FeatureNotFound(col_name.clone()))?;
            let values: Vec<f64> = column
                .cast(&DataType::Float64)?
                .as_materialized_series()
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, col_names.len()), |(r, c)| col_data[c][r]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{load_wine, train_test_split};

    fn quick_config() -> AutoMlConfig {
        AutoMlConfig::new("target").with_max_runtime_secs(30.0).with_seed(5)
    }

    #[test]
    fn test_build_model_on_wine() {
        let df = load_wine().unwrap();
        let parts = train_test_split(&df, 0.8, Some(1)).unwrap();
        let model = build_model(&parts.train, &quick_config()).unwrap();

        assert_eq!(model.classes(), &["0", "1", "2"]);
        assert_eq!(model.feature_names().len(), 13);
        assert!(model.model_id().contains("_AutoML_"));
        assert_eq!(model.leaderboard()[0].model_id, model.model_id());
        assert!(model.mean_per_class_error() < 0.2);

        let ranked: Vec<f64> = model.leaderboard().iter().map(|e| e.mean_per_class_error).collect();
        assert!(ranked.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_runs_get_distinct_ids() {
        let df = load_wine().unwrap();
        let config = quick_config().with_model_type(ModelType::NaiveBayes);
        let a = build_model(&df, &config).unwrap();
        let b = build_model(&df, &config).unwrap();

        assert!(a.model_id().starts_with("NaiveBayes_1_AutoML_"));
        assert_ne!(a.model_id(), b.model_id());

        let run = |id: &str| id.split('_').nth(3).map(str::to_string);
        assert_eq!(run(a.model_id()).map(|r| r.len()), Some(8));
        assert_eq!(run(a.leaderboard()[0].model_id.as_str()), run(a.model_id()));
    }

    #[test]
    fn test_predict_ignores_target_column() {
        let df = load_wine().unwrap();
        let parts = train_test_split(&df, 0.8, Some(2)).unwrap();
        let config = quick_config().with_model_type(ModelType::NaiveBayes);
        let model = build_model(&parts.train, &config).unwrap();

        let predictions = model.predict(&parts.test).unwrap();
        assert_eq!(predictions.len(), parts.test.height());
        for p in &predictions {
            assert_eq!(p.probabilities.len(), 3);
            assert!((p.probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_zero_budget_still_trains_one_candidate() {
        let df = load_wine().unwrap();
        let config = quick_config().with_max_runtime_secs(0.0);
        let model = build_model(&df, &config).unwrap();
        assert_eq!(model.leaderboard().len(), 1);
        assert!(model.model_id().starts_with("NaiveBayes_1_AutoML_"));
    }

    #[test]
    fn test_missing_target() {
        let df = load_wine().unwrap();
        let err = build_model(&df, &AutoMlConfig::new("quality")).unwrap_err();
        assert!(matches!(err, StudioError::FeatureNotFound(_)));
    }

    #[test]
    fn test_missing_feature_at_predict_time() {
        let df = load_wine().unwrap();
        let model = build_model(&df, &quick_config().with_model_type(ModelType::Knn)).unwrap();
        let narrowed = df.drop("proline").unwrap();
        assert!(matches!(model.predict(&narrowed), Err(StudioError::FeatureNotFound(_))));
    }

    #[test]
    fn test_prediction_display() {
        let p = Prediction {
            label: "1".to_string(),
            probabilities: vec![0.1, 0.85, 0.05],
        };
        assert_eq!(p.to_string(), "1 (0.1000, 0.8500, 0.0500)");
    }
}

//! Candidate model families searched by the AutoML engine

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use super::decision_tree::DecisionTree;
use super::knn::{KNNClassifier, KNNConfig};
use super::naive_bayes::GaussianNaiveBayes;
use super::random_forest::RandomForest;

/// Which models the AutoML search may train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ModelType {
    /// Search every family
    #[default]
    Auto,
    NaiveBayes,
    Knn,
    DecisionTree,
    RandomForest,
}

impl std::str::FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" | "automl" => Ok(ModelType::Auto),
            "naive_bayes" | "nb" => Ok(ModelType::NaiveBayes),
            "knn" => Ok(ModelType::Knn),
            "decision_tree" => Ok(ModelType::DecisionTree),
            "random_forest" | "drf" => Ok(ModelType::RandomForest),
            _ => Err(format!("Invalid model type: {}", s)),
        }
    }
}

/// Trained model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    NaiveBayes(GaussianNaiveBayes),
    Knn(KNNClassifier),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl Estimator {
    /// Prefix used in model ids
    pub fn family(&self) -> &'static str {
        match self {
            Estimator::NaiveBayes(_) => "NaiveBayes",
            Estimator::Knn(_) => "KNN",
            Estimator::DecisionTree(_) => "DecisionTree",
            Estimator::RandomForest(_) => "DRF",
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, n_classes: usize) -> Result<()> {
        match self {
            Estimator::NaiveBayes(m) => m.fit(x, y, n_classes),
            Estimator::Knn(m) => m.fit(x, y, n_classes),
            Estimator::DecisionTree(m) => m.fit(x, y, n_classes).map(|_| ()),
            Estimator::RandomForest(m) => m.fit(x, y, n_classes).map(|_| ()),
        }
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            Estimator::NaiveBayes(m) => m.predict_proba(x),
            Estimator::Knn(m) => m.predict_proba(x),
            Estimator::DecisionTree(m) => m.predict_proba(x),
            Estimator::RandomForest(m) => m.predict_proba(x),
        }
    }
}

/// Unfitted candidate, rebuilt fresh for every fold
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub model_type: ModelType,
    build: fn(Option<u64>) -> Estimator,
}

impl Candidate {
    pub fn build(&self, seed: Option<u64>) -> Estimator {
        (self.build)(seed)
    }
}

fn naive_bayes(_seed: Option<u64>) -> Estimator {
    Estimator::NaiveBayes(GaussianNaiveBayes::new())
}

fn knn(_seed: Option<u64>) -> Estimator {
    Estimator::Knn(KNNClassifier::new(KNNConfig::default()))
}

fn shallow_tree(seed: Option<u64>) -> Estimator {
    let mut tree = DecisionTree::new().with_max_depth(6).with_min_samples_leaf(2);
    if let Some(seed) = seed {
        tree = tree.with_random_state(seed);
    }
    Estimator::DecisionTree(tree)
}

fn forest(seed: Option<u64>) -> Estimator {
    let mut forest = RandomForest::new(100).with_max_depth(12);
    if let Some(seed) = seed {
        forest = forest.with_random_state(seed);
    }
    Estimator::RandomForest(forest)
}

fn deep_forest(seed: Option<u64>) -> Estimator {
    let mut forest = RandomForest::new(200);
    if let Some(seed) = seed {
        forest = forest.with_random_state(seed.wrapping_add(1));
    }
    Estimator::RandomForest(forest)
}

const CANDIDATES: [Candidate; 5] = [
    Candidate { model_type: ModelType::NaiveBayes, build: naive_bayes },
    Candidate { model_type: ModelType::Knn, build: knn },
    Candidate { model_type: ModelType::DecisionTree, build: shallow_tree },
    Candidate { model_type: ModelType::RandomForest, build: forest },
    Candidate { model_type: ModelType::RandomForest, build: deep_forest },
];

/// Candidates for a model type, in search order
pub fn candidates(model_type: ModelType) -> Vec<Candidate> {
    CANDIDATES
        .iter()
        .filter(|c| model_type == ModelType::Auto || c.model_type == model_type)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_searches_every_family() {
        assert_eq!(candidates(ModelType::Auto).len(), 5);
        assert_eq!(candidates(ModelType::RandomForest).len(), 2);
        assert_eq!(candidates(ModelType::Knn).len(), 1);
    }

    #[test]
    fn test_model_type_parse() {
        assert_eq!("random_forest".parse::<ModelType>().unwrap(), ModelType::RandomForest);
        assert!("svm".parse::<ModelType>().is_err());
    }

    #[test]
    fn test_family_prefix() {
        assert_eq!(candidates(ModelType::RandomForest)[0].build(Some(1)).family(), "DRF");
    }
}

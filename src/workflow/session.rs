//! Per-session demo state

use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use tracing::debug;

use crate::config::DemoConfig;
use crate::dataset::{load_wine, train_test_split};
use crate::error::Result;
use crate::training::Prediction;

/// Where a session is in the setup -> train -> predict sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Trained {
        model_id: String,
        accuracy: f64,
    },
    Predicted {
        model_id: String,
        accuracy: f64,
        /// Leading rows of the test partition, in order
        predictions: Vec<Prediction>,
    },
}

/// Data and results belonging to one UI session
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) train: DataFrame,
    pub(crate) test: DataFrame,
    pub(crate) model_path: Option<PathBuf>,
    pub(crate) phase: Phase,
}

impl Session {
    /// Load the wine dataset and split it into fresh partitions.
    pub fn new(config: &DemoConfig) -> Result<Self> {
        let data = load_wine()?;
        let parts = train_test_split(&data, config.train_fraction, config.split_seed)?;
        debug!(
            train_rows = parts.train.height(),
            test_rows = parts.test.height(),
            seeded = config.split_seed.is_some(),
            "Session data prepared"
        );

        Ok(Self {
            train: parts.train,
            test: parts.test,
            model_path: None,
            phase: Phase::Idle,
        })
    }

    pub fn train_df(&self) -> &DataFrame {
        &self.train
    }

    pub fn test_df(&self) -> &DataFrame {
        &self.test
    }

    /// Path of the most recently saved model
    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Prediction is only offered once a model has been saved.
    pub fn can_predict(&self) -> bool {
        self.model_path.is_some()
    }
}

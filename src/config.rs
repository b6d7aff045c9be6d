//! Demo workflow configuration

use std::path::PathBuf;

use crate::dataset::WINE_TARGET;
use crate::training::{AutoMlConfig, ModelType};

/// Settings for the setup / train / predict workflows
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub target_column: String,
    /// Fraction of rows in the train partition
    pub train_fraction: f64,
    /// Fixed split seed; `None` gives a fresh split every setup
    pub split_seed: Option<u64>,
    pub model_type: ModelType,
    pub max_runtime_secs: f64,
    pub nfolds: usize,
    /// Directory saved models are written to
    pub model_dir: PathBuf,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            target_column: WINE_TARGET.to_string(),
            train_fraction: 0.8,
            split_seed: std::env::var("SPLIT_SEED").ok().and_then(|s| s.parse().ok()),
            model_type: ModelType::Auto,
            max_runtime_secs: std::env::var("AUTOML_MAX_RUNTIME_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5.0),
            nfolds: std::env::var("AUTOML_NFOLDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            model_dir: PathBuf::from("./mymodelfolder"),
        }
    }
}

impl DemoConfig {
    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = Some(seed);
        self
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

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    /// AutoML settings for the train step. The split seed doubles as the
    /// search seed so a seeded demo is reproducible end to end.
    pub fn automl(&self) -> AutoMlConfig {
        let config = AutoMlConfig::new(self.target_column.clone())
            .with_model_type(self.model_type)
            .with_max_runtime_secs(self.max_runtime_secs)
            .with_nfolds(self.nfolds);
        match self.split_seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_automl_settings() {
        let config = DemoConfig::default()
            .with_max_runtime_secs(5.0)
            .with_nfolds(2)
            .with_split_seed(11);
        let automl = config.automl();

        assert_eq!(automl.target_column, "target");
        assert_eq!(automl.model_type, ModelType::Auto);
        assert_eq!(automl.max_runtime_secs, 5.0);
        assert_eq!(automl.nfolds, 2);
        assert_eq!(automl.seed, Some(11));
    }
}

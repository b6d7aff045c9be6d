//! Model serialization utilities
//!
//! A saved model is a single file named after the model id. The file holds a
//! bincode-encoded [`SerializedModel`] whose `model_data` is itself the
//! bincode encoding of the [`AutoMlModel`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, StudioError};
use crate::training::AutoMlModel;

/// Metadata stored next to the model bytes, readable without decoding the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    /// Estimator family of the leader
    pub model_type: String,
    pub trained_at: String,
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub classes: Vec<String>,
    /// Cross-validated metrics of the leader
    pub metrics: HashMap<String, f64>,
    /// Writer crate version
    pub version: String,
}

impl ModelMetadata {
    fn from_model(model: &AutoMlModel) -> Self {
        let metrics = HashMap::from([
            ("mean_per_class_error".to_string(), model.mean_per_class_error()),
            ("accuracy".to_string(), model.metrics().accuracy),
            ("logloss".to_string(), model.metrics().logloss),
        ]);

        Self {
            model_id: model.model_id().to_string(),
            model_type: model.estimator().family().to_string(),
            trained_at: model.trained_at().to_string(),
            feature_names: model.feature_names().to_vec(),
            target_name: model.target_column().to_string(),
            classes: model.classes().to_vec(),
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// On-disk envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedModel {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    pub format_version: u32,
    pub metadata: ModelMetadata,
    /// bincode-encoded model
    pub model_data: Vec<u8>,
    /// FNV-1a over `model_data`
    pub checksum: u64,
}

impl SerializedModel {
    const MAGIC: [u8; 4] = *b"AMLS";
    const VERSION: u32 = 1;

    pub fn new(metadata: ModelMetadata, model_data: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&model_data);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            model_data,
            checksum,
        }
    }

    fn compute_checksum(data: &[u8]) -> u64 {
        const FNV_OFFSET: u64 = 14695981039346656037;
        const FNV_PRIME: u64 = 1099511628211;

        data.iter().fold(FNV_OFFSET, |hash, &byte| (hash ^ byte as u64).wrapping_mul(FNV_PRIME))
    }

    pub fn verify_checksum(&self) -> bool {
        Self::compute_checksum(&self.model_data) == self.checksum
    }

    fn validate(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(StudioError::SerializationError("Not an automl-studio model file".to_string()));
        }
        if self.format_version != Self::VERSION {
            return Err(StudioError::SerializationError(format!(
                "Unsupported model format version {} (expected {})",
                self.format_version,
                Self::VERSION
            )));
        }
        if !self.verify_checksum() {
            return Err(StudioError::SerializationError(
                "Checksum verification failed - file may be corrupted".to_string(),
            ));
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let envelope: SerializedModel = bincode::deserialize_from(BufReader::new(file))?;
        envelope.validate()?;
        Ok(envelope)
    }
}

/// Save `model` into `output_dir` (created if missing) and return the file path.
///
/// The file name is the model id, so saving the same model twice overwrites it.
pub fn save_model(model: &AutoMlModel, output_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let model_id = model.model_id();
    if model_id.is_empty() || model_id.contains(['/', '\\']) || model_id.starts_with('.') {
        return Err(StudioError::InvalidInput(format!("Model id '{}' is not a valid file name", model_id)));
    }

    let model_data = bincode::serialize(model)?;
    let envelope = SerializedModel::new(ModelMetadata::from_model(model), model_data);

    // Readers only ever see a complete file: write aside, then rename over.
    let path = output_dir.join(model_id);
    let staging = output_dir.join(format!(".{}.tmp", model_id));
    let written = write_envelope(&staging, &envelope).and_then(|()| Ok(fs::rename(&staging, &path)?));
    if let Err(e) = written {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }

    info!(
        model_id = %model_id,
        path = %path.display(),
        bytes = envelope.model_data.len(),
        "Model saved"
    );
    Ok(path)
}

fn write_envelope(path: &Path, envelope: &SerializedModel) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, envelope)?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    Ok(())
}

/// Load a model written by [`save_model`].
pub fn load_model(path: impl AsRef<Path>) -> Result<AutoMlModel> {
    let path = path.as_ref();
    let envelope = SerializedModel::read(path)?;
    let model: AutoMlModel = bincode::deserialize(&envelope.model_data)?;

    debug!(model_id = %model.model_id(), path = %path.display(), "Model loaded");
    Ok(model)
}

/// Read only the metadata of a saved model.
pub fn inspect_model(path: impl AsRef<Path>) -> Result<ModelMetadata> {
    Ok(SerializedModel::read(path.as_ref())?.metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{load_wine, train_test_split};
    use crate::training::{build_model, AutoMlConfig, ModelType};

    fn trained_model() -> AutoMlModel {
        let df = load_wine().unwrap();
        let config = AutoMlConfig::new("target").with_model_type(ModelType::DecisionTree).with_seed(3);
        build_model(&df, &config).unwrap()
    }

    #[test]
    fn test_checksum_detects_tampering() {
        let metadata = ModelMetadata::from_model(&trained_model());
        let mut envelope = SerializedModel::new(metadata, vec![1, 2, 3, 4, 5]);
        assert!(envelope.verify_checksum());

        envelope.model_data[0] = 99;
        assert!(!envelope.verify_checksum());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let model = trained_model();

        let path = save_model(&model, dir.path().join("mymodelfolder")).unwrap();
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), model.model_id());

        let restored = load_model(&path).unwrap();
        assert_eq!(restored.model_id(), model.model_id());
        assert_eq!(restored.accuracy_percent(), model.accuracy_percent());

        let test = train_test_split(&load_wine().unwrap(), 0.8, Some(9)).unwrap().test;
        assert_eq!(restored.predict(&test).unwrap(), model.predict(&test).unwrap());
    }

    #[test]
    fn test_save_leaves_only_the_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let model = trained_model();
        save_model(&model, dir.path()).unwrap();
        save_model(&model, dir.path()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![model.model_id().to_string()]);
    }

    #[test]
    fn test_inspect_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let model = trained_model();
        let path = save_model(&model, dir.path()).unwrap();

        let metadata = inspect_model(&path).unwrap();
        assert_eq!(metadata.model_id, model.model_id());
        assert_eq!(metadata.model_type, "DecisionTree");
        assert_eq!(metadata.classes, vec!["0", "1", "2"]);
        assert_eq!(metadata.feature_names.len(), 13);
    }

    #[test]
    fn test_corrupted_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_model(&trained_model(), dir.path()).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 20;
        bytes[last] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(load_model(&path), Err(StudioError::SerializationError(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_model(dir.path().join("nope")), Err(StudioError::IoError(_))));
    }
}

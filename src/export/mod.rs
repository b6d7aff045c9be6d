//! Model serialization module
//!
//! Persists trained AutoML models to a model directory and reads them back:
//! - Binary envelope (bincode) with magic bytes, format version and metadata
//! - FNV-1a checksum over the model bytes, verified on load

mod serializer;

pub use serializer::{inspect_model, load_model, save_model, ModelMetadata, SerializedModel};

//! Model artifact loader

use super::{LinearModel, OnnxModel, PriceModel};
use crate::config::ModelConfig;
use crate::error::{EstimateError, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Serialization format of a model artifact
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Pick by file extension: `.json` is linear, anything else ONNX
    #[default]
    Auto,
    Onnx,
    Linear,
}

impl ModelKind {
    fn resolve(self, path: &Path) -> ModelKind {
        match self {
            ModelKind::Auto => match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("json") => ModelKind::Linear,
                _ => ModelKind::Onnx,
            },
            other => other,
        }
    }
}

/// Loader for price model artifacts
pub struct ModelLoader {
    kind: ModelKind,
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (auto-detect, 1 thread)
    pub fn new() -> Self {
        Self {
            kind: ModelKind::Auto,
            onnx_threads: 1,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            kind: config.kind,
            onnx_threads: config.onnx_threads.max(1),
        }
    }

    /// Load a model artifact, reporting any failure as a load error
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<dyn PriceModel>> {
        let path = path.as_ref();
        let path_display = path.display().to_string();

        if !path.is_file() {
            error!(path = %path_display, "Model file not found");
            return Err(EstimateError::model_load(path_display, "file not found"));
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        let loaded: anyhow::Result<Arc<dyn PriceModel>> = match self.kind.resolve(path) {
            ModelKind::Linear => {
                LinearModel::load(path, &name).map(|m| Arc::new(m) as Arc<dyn PriceModel>)
            }
            _ => OnnxModel::load(path, &name, self.onnx_threads)
                .map(|m| Arc::new(m) as Arc<dyn PriceModel>),
        };

        match loaded {
            Ok(model) => {
                info!(model = %model.name(), path = %path_display, "Model ready");
                Ok(model)
            }
            Err(e) => {
                error!(path = %path_display, error = %format!("{:#}", e), "Failed to load model");
                Err(EstimateError::model_load(path_display, format!("{:#}", e)))
            }
        }
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_resolution() {
        assert_eq!(ModelKind::Auto.resolve(Path::new("m.json")), ModelKind::Linear);
        assert_eq!(ModelKind::Auto.resolve(Path::new("m.JSON")), ModelKind::Linear);
        assert_eq!(ModelKind::Auto.resolve(Path::new("full_model.onnx")), ModelKind::Onnx);
        assert_eq!(ModelKind::Onnx.resolve(Path::new("m.json")), ModelKind::Onnx);
    }

    #[test]
    fn test_missing_file() {
        let err = ModelLoader::new().load("no/such/full_model.onnx").err().unwrap();
        assert!(matches!(err, EstimateError::ModelLoad { .. }));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_corrupt_linear_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();

        let err = ModelLoader::new().load(&path).err().unwrap();
        assert!(matches!(err, EstimateError::ModelLoad { .. }));
    }

    #[test]
    fn test_load_linear_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("price.json");
        std::fs::write(&path, r#"{"intercept": 1.0, "coefficients": [2.0]}"#).unwrap();

        let model = ModelLoader::new().load(&path).unwrap();
        assert_eq!(model.name(), "price");
        assert!(model.expected_features().is_none());
    }
}

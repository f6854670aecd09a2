//! ONNX regression model backed by ONNX Runtime

use super::{check_columns, numeric_row, pair_importances, PriceModel};
use crate::error::{EstimateError, Result};
use crate::feature_aligner::FeatureRow;
use anyhow::Context;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Custom metadata key holding the training column names
const FEATURE_NAMES_KEY: &str = "feature_names";
/// Custom metadata key holding per-feature importances
const FEATURE_IMPORTANCES_KEY: &str = "feature_importances";

/// Sidecar `<stem>.features.json` written next to an exported model
#[derive(Debug, Default, Deserialize)]
struct FeatureInfo {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    #[serde(default)]
    feature_importances: Option<Vec<f64>>,
}

/// Loaded ONNX regressor with its declared feature metadata
pub struct OnnxModel {
    name: String,
    /// Runs need exclusive access to the session
    session: RwLock<Session>,
    input_name: String,
    output_name: String,
    feature_names: Option<Vec<String>>,
    feature_importances: Option<Vec<f64>>,
}

impl OnnxModel {
    /// Load an ONNX model and its feature metadata from file
    pub fn load<P: AsRef<Path>>(path: P, name: &str, threads: usize) -> anyhow::Result<Self> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // sklearn-onnx regressors expose a single "variable" output
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        let (mut feature_names, mut feature_importances) = {
            let metadata = session.metadata()?;
            let names = metadata
                .custom(FEATURE_NAMES_KEY)?
                .map(|raw| parse_names(&raw));
            let importances = match metadata.custom(FEATURE_IMPORTANCES_KEY)? {
                Some(raw) => Some(
                    serde_json::from_str::<Vec<f64>>(&raw)
                        .context("Invalid feature_importances metadata")?,
                ),
                None => None,
            };
            (names, importances)
        };

        let sidecar = sidecar_path(path);
        if sidecar.exists() {
            let info = read_feature_info(&sidecar)?;
            feature_names = feature_names.or(info.feature_names);
            feature_importances = feature_importances.or(info.feature_importances);
        }

        if let (Some(names), Some(importances)) = (&feature_names, &feature_importances) {
            if names.len() != importances.len() {
                warn!(
                    model = %name,
                    names = names.len(),
                    importances = importances.len(),
                    "Feature importances do not line up with feature names, ignoring them"
                );
                feature_importances = None;
            }
        }

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            expected_features = feature_names.as_ref().map(|n| n.len()).unwrap_or(0),
            "Model loaded successfully"
        );

        Ok(Self {
            name: name.to_string(),
            session: RwLock::new(session),
            input_name,
            output_name,
            feature_names,
            feature_importances,
        })
    }
}

impl PriceModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, row: &FeatureRow) -> Result<Vec<f64>> {
        check_columns(row, self.expected_features())?;
        let values: Vec<f32> = numeric_row(row)?.into_iter().map(|v| v as f32).collect();

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, values.len() as i64];
        let input_tensor = Tensor::from_array((shape, values)).map_err(EstimateError::prediction)?;

        let mut session = self
            .session
            .write()
            .map_err(|e| EstimateError::prediction(format!("Lock error: {}", e)))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(EstimateError::prediction)?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            EstimateError::prediction(format!("model produced no '{}' output", self.output_name))
        })?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(EstimateError::prediction)?;
        let prediction: Vec<f64> = data.iter().map(|&v| v as f64).collect();

        debug!(model = %self.name, output = ?prediction, "ONNX inference complete");

        Ok(prediction)
    }

    fn expected_features(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        self.feature_importances
            .as_deref()
            .map(|imp| pair_importances(self.expected_features(), imp))
    }
}

/// Names are stored either as a JSON array or a comma-separated list
fn parse_names(raw: &str) -> Vec<String> {
    if let Ok(names) = serde_json::from_str::<Vec<String>>(raw) {
        return names;
    }
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn sidecar_path(model_path: &Path) -> PathBuf {
    let stem = model_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    model_path.with_file_name(format!("{}.features.json", stem))
}

fn read_feature_info(path: &Path) -> anyhow::Result<FeatureInfo> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Invalid feature info in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(parse_names(r#"["bedrooms","city_ Bogor"]"#), vec!["bedrooms", "city_ Bogor"]);
        assert_eq!(parse_names("bedrooms, floors,"), vec!["bedrooms", "floors"]);
    }

    #[test]
    fn test_sidecar_path() {
        let path = sidecar_path(Path::new("models/full_model.onnx"));
        assert_eq!(path, PathBuf::from("models/full_model.features.json"));
    }

    #[test]
    fn test_read_feature_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.features.json");
        std::fs::write(&path, r#"{"feature_names": ["a", "b"]}"#).unwrap();

        let info = read_feature_info(&path).unwrap();
        assert_eq!(info.feature_names.unwrap(), vec!["a", "b"]);
        assert!(info.feature_importances.is_none());
    }
}

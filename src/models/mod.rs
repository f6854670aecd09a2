//! Price model loading and inference components

pub mod inference;
pub mod linear;
pub mod loader;
pub mod onnx;

pub use inference::{InferenceEngine, Prediction};
pub use linear::LinearModel;
pub use loader::{ModelKind, ModelLoader};
pub use onnx::OnnxModel;

use crate::error::{EstimateError, Result};
use crate::feature_aligner::FeatureRow;

/// A pre-trained regression model treated as a black box.
pub trait PriceModel: Send + Sync {
    /// Human-readable model name (usually the artifact's file stem)
    fn name(&self) -> &str;

    /// Run the model on a single row, returning its flattened output.
    fn predict(&self, row: &FeatureRow) -> Result<Vec<f64>>;

    /// Ordered column names the model was fit on, when it declares them.
    fn expected_features(&self) -> Option<&[String]>;

    /// Per-feature importances paired with their column names, when known.
    fn feature_importances(&self) -> Option<Vec<(String, f64)>>;
}

/// Reject a row whose columns differ from the names a model was fit on.
pub(crate) fn check_columns(row: &FeatureRow, expected: Option<&[String]>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    if row.len() != expected.len() || !row.names().zip(expected).all(|(a, b)| a == b.as_str()) {
        let got: Vec<&str> = row.names().collect();
        return Err(EstimateError::prediction(format!(
            "feature names do not match those seen at fit time (expected {:?}, got {:?})",
            expected, got
        )));
    }
    Ok(())
}

/// Numeric view of a row, failing on the first textual column.
pub(crate) fn numeric_row(row: &FeatureRow) -> Result<Vec<f64>> {
    row.to_numeric().map_err(|column| {
        EstimateError::prediction(format!("could not convert column '{}' to float", column))
    })
}

/// Pair importances with column names, inventing positional names if needed.
pub(crate) fn pair_importances(
    names: Option<&[String]>,
    importances: &[f64],
) -> Vec<(String, f64)> {
    importances
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let name = names
                .and_then(|n| n.get(i).cloned())
                .unwrap_or_else(|| format!("x{}", i));
            (name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_columns() {
        let row: FeatureRow = vec![("a", 1.0), ("b", 2.0)].into_iter().collect();
        let same = vec!["a".to_string(), "b".to_string()];
        let swapped = vec!["b".to_string(), "a".to_string()];

        assert!(check_columns(&row, None).is_ok());
        assert!(check_columns(&row, Some(&same)).is_ok());
        assert!(check_columns(&row, Some(&swapped)).is_err());
        assert!(check_columns(&row, Some(&same[..1])).is_err());
    }

    #[test]
    fn test_pair_importances_positional_names() {
        let paired = pair_importances(None, &[0.3, 0.7]);
        assert_eq!(paired, vec![("x0".to_string(), 0.3), ("x1".to_string(), 0.7)]);
    }
}

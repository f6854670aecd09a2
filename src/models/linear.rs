//! Linear regression model stored as JSON

use super::{check_columns, numeric_row, pair_importances, PriceModel};
use crate::error::{EstimateError, Result};
use crate::feature_aligner::FeatureRow;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Linear regression with positional coefficients.
///
/// When `feature_names` is present the model only accepts rows whose columns
/// match those names in order, otherwise only the row width is checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(skip)]
    name: String,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_importances: Option<Vec<f64>>,
}

impl LinearModel {
    pub fn new(name: &str, intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            intercept,
            coefficients,
            feature_names: None,
            feature_importances: None,
        }
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }

    pub fn with_importances(mut self, importances: Vec<f64>) -> Self {
        self.feature_importances = Some(importances);
        self
    }

    /// Load a model from a JSON file
    pub fn load<P: AsRef<Path>>(path: P, name: &str) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut model: LinearModel = serde_json::from_slice(&bytes)?;
        model.name = name.to_string();
        model.check()?;

        info!(
            model = %name,
            path = %path.display(),
            coefficients = model.coefficients.len(),
            named = model.feature_names.is_some(),
            "Linear model loaded"
        );

        Ok(model)
    }

    fn check(&self) -> anyhow::Result<()> {
        let width = self.coefficients.len();
        if let Some(names) = &self.feature_names {
            anyhow::ensure!(
                names.len() == width,
                "{} feature names for {} coefficients",
                names.len(),
                width
            );
        }
        if let Some(importances) = &self.feature_importances {
            anyhow::ensure!(
                importances.len() == width,
                "{} feature importances for {} coefficients",
                importances.len(),
                width
            );
        }
        Ok(())
    }
}

impl PriceModel for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, row: &FeatureRow) -> Result<Vec<f64>> {
        check_columns(row, self.expected_features())?;
        let values = numeric_row(row)?;

        if values.len() != self.coefficients.len() {
            return Err(EstimateError::prediction(format!(
                "row has {} features, but model expects {}",
                values.len(),
                self.coefficients.len()
            )));
        }

        let price = values
            .iter()
            .zip(&self.coefficients)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.intercept;

        Ok(vec![price])
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

//! Price inference with column-order fallback

use super::PriceModel;
use crate::error::{EstimateError, Result};
use crate::feature_aligner::FeatureRow;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Result of model inference
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Estimated price (first element of the model output)
    pub price: f64,
    /// Whether the sorted-column retry produced the price
    pub used_fallback: bool,
}

/// Inference engine wrapping the process-wide model handle
#[derive(Clone)]
pub struct InferenceEngine {
    model: Arc<dyn PriceModel>,
}

impl InferenceEngine {
    pub fn new(model: Arc<dyn PriceModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &dyn PriceModel {
        self.model.as_ref()
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn expected_features(&self) -> Option<&[String]> {
        self.model.expected_features()
    }

    /// Run inference on a feature row.
    ///
    /// On failure the row is retried once with its columns sorted by name and
    /// NaN cells zeroed; a second failure is returned to the caller.
    pub fn predict(&self, row: &FeatureRow) -> Result<Prediction> {
        match self.run(row) {
            Ok(price) => Ok(Prediction {
                price,
                used_fallback: false,
            }),
            Err(first) => {
                warn!(
                    model = %self.model.name(),
                    error = %first,
                    "Inference failed, retrying with sorted columns"
                );

                let sorted = row.sorted_and_filled();
                match self.run(&sorted) {
                    Ok(price) => Ok(Prediction {
                        price,
                        used_fallback: true,
                    }),
                    Err(e) => {
                        error!(model = %self.model.name(), error = %e, "Fallback inference failed");
                        Err(e)
                    }
                }
            }
        }
    }

    fn run(&self, row: &FeatureRow) -> Result<f64> {
        let output = self.model.predict(row)?;
        let price = output
            .first()
            .copied()
            .ok_or_else(|| EstimateError::prediction("model returned an empty output"))?;

        debug!(model = %self.model.name(), columns = row.len(), price = price, "Inference complete");
        Ok(price)
    }
}

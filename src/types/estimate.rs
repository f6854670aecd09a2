//! Price estimate data structures

use crate::types::property::PropertyInput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the feature-importance ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Price estimate produced for one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEstimate {
    /// Unique estimate identifier
    pub estimate_id: String,

    /// Estimated price in rupiah
    pub price: f64,

    /// Name of the model that produced the price
    pub model: String,

    /// Whether the sorted-column retry was needed
    pub used_fallback: bool,

    /// Echo of the submitted attributes
    pub input: PropertyInput,

    /// Features ranked by importance, most important first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub importances: Vec<FeatureImportance>,

    /// Estimate generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl PriceEstimate {
    pub fn new(price: f64, model: String, input: PropertyInput) -> Self {
        Self {
            estimate_id: uuid::Uuid::new_v4().to_string(),
            price,
            model,
            used_fallback: false,
            input,
            importances: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_fallback(mut self, used_fallback: bool) -> Self {
        self.used_fallback = used_fallback;
        self
    }

    /// Attach importances, sorted descending
    pub fn with_importances(mut self, importances: Vec<(String, f64)>) -> Self {
        let mut ranked: Vec<FeatureImportance> = importances
            .into_iter()
            .map(|(feature, importance)| FeatureImportance {
                feature,
                importance,
            })
            .collect();
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        self.importances = ranked;
        self
    }
}

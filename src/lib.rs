//! House Price Estimator Library
//!
//! Aligns property attributes with the feature columns of a pre-trained
//! regression model and produces a price estimate.

pub mod config;
pub mod display;
pub mod error;
pub mod estimator;
pub mod feature_aligner;
pub mod metrics;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use error::EstimateError;
pub use estimator::{validate, Estimator};
pub use feature_aligner::{align, build_onehot, prepare_features, FeatureRow, FeatureValue};
pub use models::{InferenceEngine, ModelLoader, PriceModel};
pub use types::{City, Furnishing, PriceEstimate, PropertyInput};

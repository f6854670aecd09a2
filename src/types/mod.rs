//! Type definitions for the price estimator

pub mod estimate;
pub mod property;

pub use estimate::{FeatureImportance, PriceEstimate};
pub use property::{City, Furnishing, PropertyInput};

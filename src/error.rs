//! Error types for price estimation

use thiserror::Error;

/// Failures surfaced to the user during a load-validate-predict cycle.
///
/// None of these are fatal: the caller reports the message and the user may
/// correct the input (or supply another model) and resubmit.
#[derive(Debug, Clone, Error)]
pub enum EstimateError {
    /// Model artifact missing, unreadable or corrupt
    #[error("failed to load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    /// Submitted attributes violate a domain rule
    #[error("invalid input: {0}")]
    Validation(String),

    /// A submission arrived while no model is loaded
    #[error("model is not ready; load a model file first")]
    ModelNotReady,

    /// The model raised during inference
    #[error("prediction failed: {0}")]
    Prediction(String),
}

impl EstimateError {
    pub fn model_load(path: impl Into<String>, reason: impl ToString) -> Self {
        EstimateError::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn prediction(reason: impl ToString) -> Self {
        EstimateError::Prediction(reason.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EstimateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EstimateError::model_load("full_model.onnx", "No such file");
        assert_eq!(
            err.to_string(),
            "failed to load model from full_model.onnx: No such file"
        );

        let err = EstimateError::Validation("building larger than land".into());
        assert!(err.to_string().starts_with("invalid input"));
    }
}

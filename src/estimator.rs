//! The load-validate-predict cycle for a single submission.

use crate::error::{EstimateError, Result};
use crate::feature_aligner::prepare_features;
use crate::metrics::SessionMetrics;
use crate::models::{InferenceEngine, ModelLoader, PriceModel};
use crate::types::{PriceEstimate, PropertyInput};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Reject attributes that cannot describe a real property.
///
/// The only domain rule: the building may not be larger than its land.
pub fn validate(input: &PropertyInput) -> Result<()> {
    if input.building_size_m2 > input.land_size_m2 {
        return Err(EstimateError::Validation(format!(
            "building size ({} m²) must not exceed land size ({} m²)",
            input.building_size_m2, input.land_size_m2
        )));
    }
    Ok(())
}

/// Holds the model handle for the lifetime of the process.
///
/// A failed load is remembered rather than raised so the caller can report
/// it and offer a substitute model.
pub struct Estimator {
    loader: ModelLoader,
    engine: Option<InferenceEngine>,
    load_error: Option<EstimateError>,
    metrics: SessionMetrics,
}

impl Estimator {
    /// Load the model at `path` once; failures are kept in [`Estimator::load_error`].
    pub fn open<P: AsRef<Path>>(loader: ModelLoader, path: P) -> Self {
        let mut estimator = Self::without_model(loader);
        estimator.replace_model(path).ok();
        estimator
    }

    pub fn without_model(loader: ModelLoader) -> Self {
        Self {
            loader,
            engine: None,
            load_error: None,
            metrics: SessionMetrics::new(),
        }
    }

    /// Start with an already loaded model
    pub fn with_model(loader: ModelLoader, model: Arc<dyn PriceModel>) -> Self {
        let mut estimator = Self::without_model(loader);
        estimator.engine = Some(InferenceEngine::new(model));
        estimator
    }

    /// Load a substitute model. On success it replaces the current one; on
    /// failure the current model (if any) stays in place.
    pub fn replace_model<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        match self.loader.load(path) {
            Ok(model) => {
                self.engine = Some(InferenceEngine::new(model));
                self.load_error = None;
                Ok(())
            }
            Err(e) => {
                if self.engine.is_none() {
                    self.load_error = Some(e.clone());
                }
                Err(e)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&InferenceEngine> {
        self.engine.as_ref()
    }

    pub fn load_error(&self) -> Option<&EstimateError> {
        self.load_error.as_ref()
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Validate, align and predict for one submission.
    pub fn estimate(&self, input: &PropertyInput) -> Result<PriceEstimate> {
        self.metrics.record_submission();

        if let Err(e) = validate(input) {
            warn!(error = %e, "Submission rejected");
            self.metrics.record_validation_rejection();
            return Err(e);
        }

        let Some(engine) = &self.engine else {
            self.metrics.record_model_unavailable();
            return Err(EstimateError::ModelNotReady);
        };

        let start = Instant::now();
        let row = prepare_features(input, engine.expected_features());

        let prediction = match engine.predict(&row) {
            Ok(prediction) => prediction,
            Err(e) => {
                self.metrics.record_prediction_failure();
                return Err(e);
            }
        };

        let latency = start.elapsed();
        self.metrics
            .record_prediction(latency, prediction.used_fallback);

        info!(
            model = %engine.model_name(),
            price = prediction.price,
            used_fallback = prediction.used_fallback,
            latency_us = latency.as_micros(),
            "Price estimated"
        );

        let mut estimate = PriceEstimate::new(
            prediction.price,
            engine.model_name().to_string(),
            input.clone(),
        )
        .with_fallback(prediction.used_fallback);

        if let Some(importances) = engine.model().feature_importances() {
            estimate = estimate.with_importances(importances);
        }

        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_aligner::FeatureRow;
    use crate::models::LinearModel;
    use crate::types::{City, Furnishing};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts invocations and answers with a constant price
    struct CountingModel {
        calls: AtomicUsize,
    }

    impl PriceModel for CountingModel {
        fn name(&self) -> &str {
            "counting"
        }

        fn predict(&self, _row: &FeatureRow) -> Result<Vec<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![42.0])
        }

        fn expected_features(&self) -> Option<&[String]> {
            None
        }

        fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
            None
        }
    }

    fn input(land: f64, building: f64) -> PropertyInput {
        PropertyInput::new(City::Bogor, Furnishing::Furnished).with_sizes(land, building)
    }

    #[test]
    fn test_validate() {
        assert!(validate(&input(100.0, 90.0)).is_ok());
        assert!(validate(&input(100.0, 100.0)).is_ok());
        assert!(matches!(
            validate(&input(100.0, 120.0)),
            Err(EstimateError::Validation(_))
        ));
    }

    #[test]
    fn test_oversized_building_never_reaches_model() {
        let model = Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        });
        let estimator = Estimator::with_model(ModelLoader::new(), model.clone());

        let result = estimator.estimate(&input(100.0, 120.0));

        assert!(matches!(result, Err(EstimateError::Validation(_))));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            estimator
                .metrics()
                .validation_rejections
                .load(Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn test_validation_precedes_model_readiness() {
        let estimator = Estimator::without_model(ModelLoader::new());

        assert!(matches!(
            estimator.estimate(&input(100.0, 120.0)),
            Err(EstimateError::Validation(_))
        ));
        assert!(matches!(
            estimator.estimate(&input(100.0, 90.0)),
            Err(EstimateError::ModelNotReady)
        ));
    }

    #[test]
    fn test_missing_model_is_not_a_prediction_failure() {
        let estimator = Estimator::without_model(ModelLoader::new());

        assert!(estimator.estimate(&input(100.0, 90.0)).is_err());

        let metrics = estimator.metrics();
        assert_eq!(metrics.model_unavailable.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.prediction_failures.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_failed_open_remembers_error() {
        let estimator = Estimator::open(ModelLoader::new(), "missing/full_model.onnx");

        assert!(!estimator.is_ready());
        assert!(matches!(
            estimator.load_error(),
            Some(EstimateError::ModelLoad { .. })
        ));
    }

    #[test]
    fn test_estimate_with_named_model() {
        let names: Vec<String> = ["bedrooms", "city_Bogor", "furnishing_furnished"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let model = LinearModel::new("lm", 100.0, vec![10.0, 1000.0, 5.0])
            .with_feature_names(names)
            .with_importances(vec![0.2, 0.5, 0.3]);
        let estimator = Estimator::with_model(ModelLoader::new(), Arc::new(model));

        let estimate = estimator.estimate(&input(100.0, 90.0)).unwrap();

        // 100 + 3*10 + 1*1000 + 1*5
        assert_eq!(estimate.price, 1135.0);
        assert!(!estimate.used_fallback);
        assert_eq!(estimate.importances[0].feature, "city_Bogor");
        assert_eq!(estimate.model, "lm");
    }
}

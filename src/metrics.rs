//! Per-session statistics for the estimator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tracing::info;

/// Counters for one run of the estimator
pub struct SessionMetrics {
    /// Submissions received
    pub submissions: AtomicU64,
    /// Successful predictions
    pub predictions: AtomicU64,
    /// Predictions that needed the sorted-column retry
    pub fallbacks: AtomicU64,
    /// Submissions rejected by input validation
    pub validation_rejections: AtomicU64,
    /// Submissions the model failed on
    pub prediction_failures: AtomicU64,
    /// Valid submissions that arrived with no model loaded
    pub model_unavailable: AtomicU64,
    /// Prediction latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            submissions: AtomicU64::new(0),
            predictions: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
            validation_rejections: AtomicU64::new(0),
            prediction_failures: AtomicU64::new(0),
            model_unavailable: AtomicU64::new(0),
            latencies: RwLock::new(Vec::new()),
        }
    }

    pub fn record_submission(&self) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prediction(&self, latency: Duration, used_fallback: bool) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        if used_fallback {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
        }
        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency.as_micros() as u64);
        }
    }

    pub fn record_validation_rejection(&self) {
        self.validation_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prediction_failure(&self) {
        self.prediction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_model_unavailable(&self) {
        self.model_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    /// Get prediction latency statistics
    pub fn latency_stats(&self) -> LatencyStats {
        let Ok(latencies) = self.latencies.read() else {
            return LatencyStats::default();
        };
        if latencies.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = latencies.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            max_us: sorted[count - 1],
        }
    }

    /// Log a summary of the session
    pub fn print_summary(&self) {
        let latency = self.latency_stats();
        info!(
            submissions = self.submissions.load(Ordering::Relaxed),
            predictions = self.predictions.load(Ordering::Relaxed),
            fallbacks = self.fallbacks.load(Ordering::Relaxed),
            validation_rejections = self.validation_rejections.load(Ordering::Relaxed),
            prediction_failures = self.prediction_failures.load(Ordering::Relaxed),
            model_unavailable = self.model_unavailable.load(Ordering::Relaxed),
            mean_latency_us = latency.mean_us,
            p50_latency_us = latency.p50_us,
            max_latency_us = latency.max_us,
            "Session summary"
        );
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Prediction latency statistics
#[derive(Debug, Default, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub max_us: u64,
}

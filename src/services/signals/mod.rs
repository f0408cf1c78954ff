//! Prediction lifecycle service module.
//!
//! Turns market samples into directional predictions, tracks them through
//! their evaluation window, labels the realized outcome and retunes the
//! scoring weights from observed accuracy.

pub mod adjuster;
pub mod evaluator;
pub mod generator;
pub mod indicators;
pub mod performance;
pub mod predictions;
pub mod scorer;

pub use adjuster::{adjust, AdjusterState, AdjustmentTrigger, StrategyAdjuster};
pub use evaluator::{EvaluationStatus, OutcomeEvaluator};
pub use generator::PredictionGenerator;
pub use performance::{PerformanceAnalyzer, PerformanceSummary};
pub use predictions::PredictionStore;
pub use scorer::IndicatorScorer;

use crate::types::{IndicatorKind, MarketSample};

/// Trait for implementing technical indicators.
pub trait Indicator: Send + Sync {
    /// Which weighted input this indicator provides.
    fn kind(&self) -> IndicatorKind;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Minimum number of samples required for calculation.
    fn min_periods(&self) -> usize;

    /// Calculate the raw indicator value.
    /// Returns None if insufficient data or calculation fails.
    fn calculate(&self, samples: &[MarketSample]) -> Option<f64>;

    /// Raw value reported when the indicator cannot be calculated.
    fn neutral(&self) -> f64 {
        0.0
    }

    /// Map a raw value to a directional contribution in [-1, 1].
    fn contribution(&self, value: f64) -> f64;
}

/// Clamp a contribution to [-1, 1]; non-finite values are neutral.
pub fn clamp_contribution(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Close prices of a sample series.
pub(crate) fn closes(samples: &[MarketSample]) -> Vec<f64> {
    samples.iter().map(|s| s.close).collect()
}

/// Arithmetic mean, None for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_contribution() {
        assert_eq!(clamp_contribution(3.0), 1.0);
        assert_eq!(clamp_contribution(-3.0), -1.0);
        assert_eq!(clamp_contribution(0.25), 0.25);
        assert_eq!(clamp_contribution(f64::NAN), 0.0);
        assert_eq!(clamp_contribution(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }
}

use super::IndicatorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Allowed range for each indicator weight.
pub const INDICATOR_WEIGHT_BOUNDS: (f64, f64) = (0.05, 0.5);
/// Allowed range for the auxiliary signal weight.
pub const AUXILIARY_WEIGHT_BOUNDS: (f64, f64) = (0.1, 0.5);
/// Allowed range for the confidence threshold.
pub const CONFIDENCE_THRESHOLD_BOUNDS: (f64, f64) = (0.4, 0.8);

/// Weights and thresholds read by the generator and replaced by the adjuster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Monotonic version, starting at 1.
    pub version: i64,
    pub indicator_weights: BTreeMap<IndicatorKind, f64>,
    pub auxiliary_weight: f64,
    pub confidence_threshold: f64,
    pub learning_rate: f64,
    /// Step applied to the confidence threshold.
    pub adjustment_sensitivity: f64,
    pub updated_at: DateTime<Utc>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        let indicator_weights = BTreeMap::from([
            (IndicatorKind::Rsi, 0.25),
            (IndicatorKind::Macd, 0.25),
            (IndicatorKind::MaTrend, 0.20),
            (IndicatorKind::Volume, 0.15),
            (IndicatorKind::Bollinger, 0.15),
            (IndicatorKind::Momentum, 0.10),
        ]);

        Self {
            version: 1,
            indicator_weights,
            auxiliary_weight: 0.3,
            confidence_threshold: 0.6,
            learning_rate: 0.1,
            adjustment_sensitivity: 0.05,
            updated_at: Utc::now(),
        }
    }
}

impl StrategyConfig {
    /// Weight for an indicator, zero when it is not configured.
    pub fn weight(&self, kind: IndicatorKind) -> f64 {
        self.indicator_weights.get(&kind).copied().unwrap_or(0.0)
    }

    /// Copy with every tunable value forced into its declared range.
    ///
    /// Non-finite values fall back to the lower bound.
    pub fn clamped(mut self) -> Self {
        for weight in self.indicator_weights.values_mut() {
            *weight = clamp_bounds(*weight, INDICATOR_WEIGHT_BOUNDS);
        }
        self.auxiliary_weight = clamp_bounds(self.auxiliary_weight, AUXILIARY_WEIGHT_BOUNDS);
        self.confidence_threshold =
            clamp_bounds(self.confidence_threshold, CONFIDENCE_THRESHOLD_BOUNDS);
        self
    }

    /// Whether every tunable value is inside its range.
    pub fn is_within_bounds(&self) -> bool {
        let within = |v: f64, (lo, hi): (f64, f64)| v >= lo && v <= hi;
        self.indicator_weights
            .values()
            .all(|w| within(*w, INDICATOR_WEIGHT_BOUNDS))
            && within(self.auxiliary_weight, AUXILIARY_WEIGHT_BOUNDS)
            && within(self.confidence_threshold, CONFIDENCE_THRESHOLD_BOUNDS)
    }
}

fn clamp_bounds(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        lo
    }
}

/// A persisted strategy version and what produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyVersion {
    pub config: StrategyConfig,
    /// "default" for the seeded version, otherwise the adjustment trigger.
    pub trigger: String,
}

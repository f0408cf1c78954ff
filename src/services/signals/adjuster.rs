//! Bounded online retuning of indicator weights, auxiliary weight and
//! confidence threshold from recent accuracy.
//!
//! The rule is a heuristic nudge toward indicators that were aligned with
//! the realized move, not a fitted model.

use super::performance::accuracy_of;
use crate::config::AdjusterSettings;
use crate::error::Result;
use crate::services::sqlite_store::AccuracyStats;
use crate::services::StrategyStore;
use crate::types::{
    AnalyzedRecord, IndicatorKind, StrategyConfig, AUXILIARY_WEIGHT_BOUNDS,
    CONFIDENCE_THRESHOLD_BOUNDS, INDICATOR_WEIGHT_BOUNDS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Adjuster state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjusterState {
    Stable,
    Adjusting,
}

/// Why an adjustment was started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentTrigger {
    /// Recent accuracy fell too far below the all-time accuracy.
    AccuracyDrop { recent: f64, all_time: f64 },
    /// The last N records were all incorrect.
    LosingStreak(usize),
}

impl fmt::Display for AdjustmentTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccuracyDrop { recent, all_time } => write!(
                f,
                "accuracy_drop: recent {:.3} vs all-time {:.3}",
                recent, all_time
            ),
            Self::LosingStreak(n) => write!(f, "losing_streak: {} incorrect", n),
        }
    }
}

/// Decide whether `records` (chronological) call for an adjustment.
pub fn check_trigger(
    records: &[AnalyzedRecord],
    all_time_accuracy: f64,
    settings: &AdjusterSettings,
) -> Option<AdjustmentTrigger> {
    if records.is_empty() {
        return None;
    }

    let recent = &records[records.len().saturating_sub(settings.recent_window)..];
    let recent_accuracy = accuracy_of(recent);
    if all_time_accuracy - recent_accuracy > settings.accuracy_drop_threshold {
        return Some(AdjustmentTrigger::AccuracyDrop {
            recent: recent_accuracy,
            all_time: all_time_accuracy,
        });
    }

    let streak = settings.losing_streak;
    if streak > 0
        && records.len() >= streak
        && records[records.len() - streak..].iter().all(|r| !r.is_correct)
    {
        return Some(AdjustmentTrigger::LosingStreak(streak));
    }

    None
}

/// Apply the adjustment rule to `config` using `records`.
///
/// Indicator weights, auxiliary weight and threshold are adjusted
/// independently and each result is clamped to its range.
pub fn adjust(
    config: &StrategyConfig,
    records: &[AnalyzedRecord],
    settings: &AdjusterSettings,
) -> StrategyConfig {
    let mut next = config.clone();
    let lr = config.learning_rate;

    // Indicator weights
    for (kind, weight) in next.indicator_weights.iter_mut() {
        if let Some(accuracy) = indicator_accuracy(records, *kind) {
            let (lo, hi) = INDICATOR_WEIGHT_BOUNDS;
            *weight = (*weight + lr * (accuracy - 0.5)).clamp(lo, hi);
        }
    }

    // Auxiliary weight
    if let Some(ratio) = auxiliary_helpful_ratio(records) {
        let (lo, hi) = AUXILIARY_WEIGHT_BOUNDS;
        if ratio > 0.6 {
            next.auxiliary_weight = (next.auxiliary_weight + (ratio - 0.5) * lr).min(hi);
        } else if ratio < 0.4 {
            next.auxiliary_weight = (next.auxiliary_weight - (0.5 - ratio) * lr).max(lo);
        }
    }

    // Confidence threshold
    let high = bucket_accuracy(records, |c| c >= settings.high_confidence);
    let low = bucket_accuracy(records, |c| c <= settings.low_confidence);

    if let (Some(high_accuracy), Some(low_accuracy)) = (high, low) {
        let (lo, hi) = CONFIDENCE_THRESHOLD_BOUNDS;
        let step = config.adjustment_sensitivity;

        if low_accuracy > high_accuracy && low_accuracy > settings.confidence_accuracy_floor {
            next.confidence_threshold = (next.confidence_threshold - step).max(lo);
        } else if high_accuracy < settings.confidence_accuracy_floor {
            next.confidence_threshold = (next.confidence_threshold + step).min(hi);
        }
    }

    next
}

/// Accuracy of the records whose confidence satisfies `in_bucket`.
fn bucket_accuracy(records: &[AnalyzedRecord], in_bucket: impl Fn(f64) -> bool) -> Option<f64> {
    let (total, correct) = records
        .iter()
        .filter(|r| in_bucket(r.prediction.confidence))
        .fold((0usize, 0usize), |(total, correct), r| {
            (total + 1, correct + usize::from(r.is_correct))
        });
    if total == 0 {
        return None;
    }
    Some(correct as f64 / total as f64)
}

/// Fraction of records on which the indicator was aligned.
fn indicator_accuracy(records: &[AnalyzedRecord], kind: IndicatorKind) -> Option<f64> {
    let readings: Vec<bool> = records
        .iter()
        .filter_map(|r| r.alignment.get(&kind).copied())
        .collect();
    if readings.is_empty() {
        return None;
    }
    Some(readings.iter().filter(|a| **a).count() as f64 / readings.len() as f64)
}

/// Fraction of auxiliary-bearing records where the auxiliary signal helped.
fn auxiliary_helpful_ratio(records: &[AnalyzedRecord]) -> Option<f64> {
    let with_auxiliary: Vec<&AnalyzedRecord> = records
        .iter()
        .filter(|r| r.auxiliary_aligned.is_some())
        .collect();
    if with_auxiliary.is_empty() {
        return None;
    }

    let helpful = with_auxiliary
        .iter()
        .filter(|r| {
            let aligned = r.auxiliary_aligned == Some(true);
            let corrected = !r.technical_correct && r.is_correct;
            let preserved = r.technical_correct && r.is_correct;
            aligned && (corrected || preserved)
        })
        .count();

    Some(helpful as f64 / with_auxiliary.len() as f64)
}

/// Runs the trigger check on each new analyzed record and writes adjusted
/// configurations through the strategy store.
pub struct StrategyAdjuster {
    settings: AdjusterSettings,
    state: Mutex<AdjusterState>,
    strategy: Arc<StrategyStore>,
}

impl StrategyAdjuster {
    pub fn new(settings: AdjusterSettings, strategy: Arc<StrategyStore>) -> Self {
        Self {
            settings,
            state: Mutex::new(AdjusterState::Stable),
            strategy,
        }
    }

    pub fn settings(&self) -> &AdjusterSettings {
        &self.settings
    }

    pub fn state(&self) -> AdjusterState {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_state(&self, state: AdjusterState) {
        match self.state.lock() {
            Ok(mut guard) => *guard = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }

    /// React to a newly analyzed record.
    ///
    /// `window` holds the most recent analyzed records, oldest first.
    /// Returns the new configuration when an adjustment was written.
    pub fn on_new_record(
        &self,
        window: &[AnalyzedRecord],
        all_time: AccuracyStats,
    ) -> Result<Option<Arc<StrategyConfig>>> {
        if (all_time.total as usize) < self.settings.min_records {
            debug!(
                "Skipping strategy check: {} evaluated records, need {}",
                all_time.total, self.settings.min_records
            );
            return Ok(None);
        }

        let trigger = match check_trigger(window, all_time.accuracy(), &self.settings) {
            Some(trigger) => trigger,
            None => {
                self.set_state(AdjusterState::Stable);
                return Ok(None);
            }
        };

        self.set_state(AdjusterState::Adjusting);
        info!("Strategy adjustment triggered ({})", trigger);

        let analysis = &window[window.len().saturating_sub(self.settings.analysis_window)..];
        let result = self
            .strategy
            .update(&trigger.to_string(), |current| {
                adjust(current, analysis, &self.settings)
            });
        self.set_state(AdjusterState::Stable);

        match result {
            Ok(config) => {
                info!(
                    "Adjusted strategy v{}: threshold {:.2}, auxiliary weight {:.2}",
                    config.version, config.confidence_threshold, config.auxiliary_weight
                );
                Ok(Some(config))
            }
            Err(e) => {
                warn!("Strategy adjustment failed: {}", e);
                Err(e)
            }
        }
    }
}

//! Correctness, error classification and indicator alignment for evaluated predictions.

use crate::services::sqlite_store::AccuracyStats;
use crate::types::{
    AnalyzedRecord, Direction, ErrorClass, EvaluatedPrediction, IndicatorKind, Outcome,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A HOLD call is correct while the price moved less than this fraction.
///
/// Looser than the 0.5% band used to label the realized direction.
pub const HOLD_CORRECT_THRESHOLD: f64 = 0.01;

/// |auxiliary signal| below this counts as agreeing with a HOLD outcome.
pub const AUXILIARY_NEUTRAL_BAND: f64 = 0.2;

/// Cached analyses kept before the cache is reset.
const MAX_CACHED_RECORDS: usize = 5_000;

/// Whether a call matched the realized move.
pub fn is_call_correct(predicted: Direction, outcome: &Outcome) -> bool {
    match predicted {
        Direction::Hold => outcome.price_change.abs() < HOLD_CORRECT_THRESHOLD,
        _ => predicted == outcome.actual_direction,
    }
}

/// Label an evaluated call. Correctness takes precedence over the direction pair.
pub fn classify_error(predicted: Direction, actual: Direction, is_correct: bool) -> ErrorClass {
    if is_correct {
        return ErrorClass::Correct;
    }
    match (predicted, actual) {
        (Direction::Hold, Direction::Up | Direction::Down) => ErrorClass::MissedOpportunity,
        (Direction::Up | Direction::Down, Direction::Hold) => ErrorClass::FalseSignal,
        (Direction::Up, Direction::Down) | (Direction::Down, Direction::Up) => ErrorClass::Inverted,
        _ => ErrorClass::Other,
    }
}

/// Whether an indicator's raw reading pointed the way the market went.
///
/// Every reading counts as aligned with a HOLD outcome.
pub fn indicator_aligned(kind: IndicatorKind, value: f64, actual: Direction) -> bool {
    match actual {
        Direction::Hold => true,
        Direction::Up => match kind {
            IndicatorKind::Rsi => value < 40.0,
            IndicatorKind::Bollinger => value < 0.3,
            IndicatorKind::Macd
            | IndicatorKind::MaTrend
            | IndicatorKind::Volume
            | IndicatorKind::Momentum => value > 0.0,
        },
        Direction::Down => match kind {
            IndicatorKind::Rsi => value > 60.0,
            IndicatorKind::Bollinger => value > 0.7,
            IndicatorKind::Macd
            | IndicatorKind::MaTrend
            | IndicatorKind::Volume
            | IndicatorKind::Momentum => value < 0.0,
        },
    }
}

/// Whether the auxiliary signal pointed the way the market went.
pub fn auxiliary_aligned(signal: f64, actual: Direction) -> bool {
    match actual {
        Direction::Hold => signal.abs() < AUXILIARY_NEUTRAL_BAND,
        Direction::Up => signal > 0.0,
        Direction::Down => signal < 0.0,
    }
}

/// Accuracy for one predicted direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionStats {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
}

impl DirectionStats {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
        self.accuracy = self.correct as f64 / self.total as f64;
    }
}

/// Aggregate view over evaluated predictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// All-time evaluated predictions.
    pub total: i64,
    pub correct: i64,
    pub accuracy: f64,
    /// Accuracy over the most recent `recent_window` records.
    pub recent_accuracy: f64,
    pub recent_window: usize,
    /// Records the breakdowns below were computed from.
    pub analyzed: usize,
    pub up: DirectionStats,
    pub down: DirectionStats,
    pub hold: DirectionStats,
    /// Accuracy of the technical-only call.
    pub technical_accuracy: f64,
    pub error_breakdown: BTreeMap<ErrorClass, usize>,
    /// Fraction of records each indicator was aligned on.
    pub indicator_alignment: BTreeMap<IndicatorKind, f64>,
}

/// Derives analyzed records and caches them by prediction id.
pub struct PerformanceAnalyzer {
    cache: DashMap<String, AnalyzedRecord>,
}

impl PerformanceAnalyzer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Analyze one evaluated prediction.
    pub fn analyze(&self, record: &EvaluatedPrediction) -> AnalyzedRecord {
        if let Some(cached) = self.cache.get(&record.prediction.id) {
            return cached.clone();
        }

        let analyzed = analyze_record(record);

        if self.cache.len() >= MAX_CACHED_RECORDS {
            debug!("Analyzed record cache full, clearing");
            self.cache.clear();
        }
        self.cache
            .insert(record.prediction.id.clone(), analyzed.clone());
        analyzed
    }

    /// Analyze a batch, preserving order.
    pub fn analyze_all(&self, records: &[EvaluatedPrediction]) -> Vec<AnalyzedRecord> {
        records.iter().map(|r| self.analyze(r)).collect()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Summarize `records` (chronological) against all-time totals.
    pub fn summarize(
        &self,
        records: &[AnalyzedRecord],
        all_time: AccuracyStats,
        recent_window: usize,
    ) -> PerformanceSummary {
        let mut summary = PerformanceSummary {
            total: all_time.total,
            correct: all_time.correct,
            accuracy: all_time.accuracy(),
            recent_window,
            analyzed: records.len(),
            ..Default::default()
        };

        let recent = &records[records.len().saturating_sub(recent_window)..];
        summary.recent_accuracy = accuracy_of(recent);

        let mut technical_correct = 0usize;
        let mut aligned_counts: BTreeMap<IndicatorKind, (usize, usize)> = BTreeMap::new();

        for record in records {
            match record.prediction.direction {
                Direction::Up => summary.up.record(record.is_correct),
                Direction::Down => summary.down.record(record.is_correct),
                Direction::Hold => summary.hold.record(record.is_correct),
            }
            *summary.error_breakdown.entry(record.error_class).or_default() += 1;
            if record.technical_correct {
                technical_correct += 1;
            }
            for (kind, aligned) in &record.alignment {
                let entry = aligned_counts.entry(*kind).or_default();
                entry.1 += 1;
                if *aligned {
                    entry.0 += 1;
                }
            }
        }

        if !records.is_empty() {
            summary.technical_accuracy = technical_correct as f64 / records.len() as f64;
        }
        summary.indicator_alignment = aligned_counts
            .into_iter()
            .map(|(kind, (aligned, total))| (kind, aligned as f64 / total as f64))
            .collect();

        summary
    }
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }
}

/// Fraction of correct records, 0 when empty.
pub fn accuracy_of(records: &[AnalyzedRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().filter(|r| r.is_correct).count() as f64 / records.len() as f64
}

fn analyze_record(record: &EvaluatedPrediction) -> AnalyzedRecord {
    let prediction = &record.prediction;
    let outcome = &record.outcome;
    let actual = outcome.actual_direction;

    let is_correct = is_call_correct(prediction.direction, outcome);
    let technical_correct = is_call_correct(prediction.technical.direction, outcome);
    let error_class = classify_error(prediction.direction, actual, is_correct);

    let alignment = prediction
        .indicators
        .iter()
        .map(|(kind, value)| (*kind, indicator_aligned(*kind, *value, actual)))
        .collect();

    let auxiliary_aligned = prediction
        .auxiliary
        .map(|aux| auxiliary_aligned(aux.signal, actual));

    AnalyzedRecord {
        prediction: prediction.clone(),
        outcome: outcome.clone(),
        is_correct,
        technical_correct,
        error_class,
        alignment,
        auxiliary_aligned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuxiliarySnapshot, IndicatorSnapshot, Prediction, TechnicalCall};
    use chrono::{Duration, TimeZone, Utc};

    fn create_test_record(
        id: &str,
        predicted: Direction,
        actual: Direction,
        price_change: f64,
    ) -> EvaluatedPrediction {
        let generated_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        EvaluatedPrediction {
            prediction: Prediction {
                id: id.to_string(),
                generated_at,
                direction: predicted,
                confidence: 0.65,
                score: 0.65,
                technical: TechnicalCall {
                    direction: predicted,
                    confidence: 0.65,
                },
                reference_price: 100.0,
                indicators: IndicatorSnapshot::from([
                    (IndicatorKind::Rsi, 35.0),
                    (IndicatorKind::Macd, 0.1),
                    (IndicatorKind::Bollinger, 0.5),
                ]),
                auxiliary: Some(AuxiliarySnapshot {
                    signal: 0.4,
                    weight: 0.3,
                }),
                window_minutes: 15,
                strategy_version: 1,
                no_data: false,
                reason: String::new(),
            },
            outcome: Outcome {
                prediction_id: id.to_string(),
                actual_direction: actual,
                price_change,
                observed_price: 100.0 * (1.0 + price_change),
                evaluated_at: generated_at + Duration::minutes(20),
            },
        }
    }

    #[test]
    fn test_hold_correct_within_one_percent() {
        let record = create_test_record("a", Direction::Hold, Direction::Hold, 0.003);
        let analyzed = analyze_record(&record);
        assert!(analyzed.is_correct);
        assert_eq!(analyzed.error_class, ErrorClass::Correct);
    }

    #[test]
    fn test_hold_correct_between_thresholds() {
        // Labeled UP by the 0.5% band but still inside the 1% HOLD band
        let record = create_test_record("a", Direction::Hold, Direction::Up, 0.008);
        assert!(analyze_record(&record).is_correct);
    }

    #[test]
    fn test_hold_missed_opportunity() {
        let record = create_test_record("a", Direction::Hold, Direction::Up, 0.02);
        let analyzed = analyze_record(&record);
        assert!(!analyzed.is_correct);
        assert_eq!(analyzed.error_class, ErrorClass::MissedOpportunity);
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(
            classify_error(Direction::Up, Direction::Hold, false),
            ErrorClass::FalseSignal
        );
        assert_eq!(
            classify_error(Direction::Down, Direction::Up, false),
            ErrorClass::Inverted
        );
        assert_eq!(
            classify_error(Direction::Up, Direction::Up, true),
            ErrorClass::Correct
        );
        assert_eq!(
            classify_error(Direction::Up, Direction::Up, false),
            ErrorClass::Other
        );
    }

    #[test]
    fn test_indicator_alignment_rules() {
        assert!(indicator_aligned(IndicatorKind::Rsi, 35.0, Direction::Up));
        assert!(!indicator_aligned(IndicatorKind::Rsi, 45.0, Direction::Up));
        assert!(indicator_aligned(IndicatorKind::Rsi, 65.0, Direction::Down));
        assert!(indicator_aligned(IndicatorKind::Bollinger, 0.2, Direction::Up));
        assert!(indicator_aligned(IndicatorKind::Bollinger, 0.8, Direction::Down));
        assert!(!indicator_aligned(IndicatorKind::Bollinger, 0.5, Direction::Down));
        assert!(indicator_aligned(IndicatorKind::Volume, -0.1, Direction::Down));
        assert!(indicator_aligned(IndicatorKind::Momentum, 0.1, Direction::Up));
        assert!(indicator_aligned(IndicatorKind::Macd, -5.0, Direction::Hold));
    }

    #[test]
    fn test_auxiliary_alignment() {
        assert!(auxiliary_aligned(0.1, Direction::Hold));
        assert!(!auxiliary_aligned(0.3, Direction::Hold));
        assert!(auxiliary_aligned(0.3, Direction::Up));
        assert!(auxiliary_aligned(-0.3, Direction::Down));
    }

    #[test]
    fn test_analyze_populates_alignment() {
        let record = create_test_record("a", Direction::Up, Direction::Up, 0.01);
        let analyzed = analyze_record(&record);

        assert_eq!(analyzed.alignment.len(), 3);
        assert!(analyzed.alignment[&IndicatorKind::Rsi]);
        assert!(analyzed.alignment[&IndicatorKind::Macd]);
        assert!(!analyzed.alignment[&IndicatorKind::Bollinger]);
        assert_eq!(analyzed.auxiliary_aligned, Some(true));
    }

    #[test]
    fn test_analyzer_caches() {
        let analyzer = PerformanceAnalyzer::new();
        let record = create_test_record("cached", Direction::Up, Direction::Down, -0.02);

        let first = analyzer.analyze(&record);
        let second = analyzer.analyze(&record);
        assert_eq!(first, second);
        assert_eq!(analyzer.cached_count(), 1);
        assert_eq!(first.error_class, ErrorClass::Inverted);
    }

    #[test]
    fn test_summarize() {
        let analyzer = PerformanceAnalyzer::new();
        let records = vec![
            create_test_record("1", Direction::Up, Direction::Up, 0.01),
            create_test_record("2", Direction::Up, Direction::Down, -0.01),
            create_test_record("3", Direction::Hold, Direction::Hold, 0.001),
            create_test_record("4", Direction::Down, Direction::Down, -0.02),
        ];
        let analyzed = analyzer.analyze_all(&records);
        let all_time = AccuracyStats {
            total: 10,
            correct: 6,
        };

        let summary = analyzer.summarize(&analyzed, all_time, 2);

        assert_eq!(summary.total, 10);
        assert!((summary.accuracy - 0.6).abs() < 1e-12);
        assert_eq!(summary.recent_accuracy, 1.0);
        assert_eq!(summary.up.total, 2);
        assert_eq!(summary.up.correct, 1);
        assert_eq!(summary.hold.correct, 1);
        assert_eq!(summary.error_breakdown[&ErrorClass::Correct], 3);
        assert_eq!(summary.error_breakdown[&ErrorClass::Inverted], 1);
        assert!((summary.technical_accuracy - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_summarize_empty() {
        let analyzer = PerformanceAnalyzer::new();
        let summary = analyzer.summarize(&[], AccuracyStats::default(), 20);
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.recent_accuracy, 0.0);
        assert!(summary.error_breakdown.is_empty());
    }
}

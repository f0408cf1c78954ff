//! Maps market samples to raw indicator readings and per-indicator contributions.

use super::indicators::all_indicators;
use super::Indicator;
use crate::types::{IndicatorKind, IndicatorSnapshot, MarketSample};
use std::collections::BTreeMap;
use tracing::debug;

/// Pure indicator pipeline over a fixed indicator set.
pub struct IndicatorScorer {
    indicators: Vec<Box<dyn Indicator>>,
}

impl Default for IndicatorScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorScorer {
    pub fn new() -> Self {
        Self {
            indicators: all_indicators(),
        }
    }

    /// Raw reading for every indicator.
    ///
    /// Indicators lacking history report their neutral value. Returns None
    /// only when there is no usable sample at all.
    pub fn snapshot(&self, samples: &[MarketSample]) -> Option<IndicatorSnapshot> {
        let usable: Vec<MarketSample> = samples.iter().filter(|s| s.is_finite()).copied().collect();
        if usable.is_empty() {
            return None;
        }
        if usable.len() < samples.len() {
            debug!(
                "Dropped {} non-finite samples before scoring",
                samples.len() - usable.len()
            );
        }

        let snapshot = self
            .indicators
            .iter()
            .map(|indicator| {
                let value = indicator
                    .calculate(&usable)
                    .filter(|v| v.is_finite())
                    .unwrap_or_else(|| indicator.neutral());
                (indicator.kind(), value)
            })
            .collect();

        Some(snapshot)
    }

    /// Contribution in [-1, 1] for each reading in the snapshot.
    pub fn contributions(&self, snapshot: &IndicatorSnapshot) -> BTreeMap<IndicatorKind, f64> {
        snapshot
            .iter()
            .filter_map(|(kind, value)| {
                let indicator = self.indicators.iter().find(|i| i.kind() == *kind)?;
                Some((*kind, indicator.contribution(*value)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::*;

    #[test]
    fn test_snapshot_empty_samples() {
        assert!(IndicatorScorer::new().snapshot(&[]).is_none());
    }

    #[test]
    fn test_snapshot_short_history_is_neutral() {
        let scorer = IndicatorScorer::new();
        let snapshot = scorer.snapshot(&create_uptrend_samples(3)).unwrap();

        assert_eq!(snapshot.len(), IndicatorKind::ALL.len());
        assert_eq!(snapshot[&IndicatorKind::Rsi], 50.0);
        assert_eq!(snapshot[&IndicatorKind::Macd], 0.0);
        assert_eq!(snapshot[&IndicatorKind::Bollinger], 0.5);
        assert_eq!(snapshot[&IndicatorKind::MaTrend], 0.0);

        let contributions = scorer.contributions(&snapshot);
        assert!(contributions.values().all(|c| *c == 0.0));
    }

    #[test]
    fn test_snapshot_skips_non_finite_samples() {
        let mut samples = create_uptrend_samples(40);
        samples[10].close = f64::NAN;
        let snapshot = IndicatorScorer::new().snapshot(&samples).unwrap();
        assert!(snapshot.values().all(|v| v.is_finite()));
    }

    #[test]
    fn test_contributions_bounded_for_trends() {
        let scorer = IndicatorScorer::new();
        for samples in [
            create_uptrend_samples(60),
            create_downtrend_samples(60),
            create_flat_samples(60),
        ] {
            let snapshot = scorer.snapshot(&samples).unwrap();
            for (kind, c) in scorer.contributions(&snapshot) {
                assert!((-1.0..=1.0).contains(&c), "{:?} out of range: {}", kind, c);
            }
        }
    }

    #[test]
    fn test_contributions_for_reference_readings() {
        let scorer = IndicatorScorer::new();
        let snapshot = IndicatorSnapshot::from([
            (IndicatorKind::Rsi, 25.0),
            (IndicatorKind::Macd, 0.02),
            (IndicatorKind::MaTrend, 0.01),
            (IndicatorKind::Volume, 0.0),
            (IndicatorKind::Bollinger, 0.15),
        ]);
        let c = scorer.contributions(&snapshot);

        assert_eq!(c.len(), 5);
        assert_eq!(c[&IndicatorKind::Rsi], 0.8);
        assert_eq!(c[&IndicatorKind::Macd], 1.0);
        assert!((c[&IndicatorKind::MaTrend] - 0.1).abs() < 1e-12);
        assert_eq!(c[&IndicatorKind::Volume], 0.0);
        assert_eq!(c[&IndicatorKind::Bollinger], 0.7);
    }
}

//! Technical indicator implementations.

pub mod bollinger;
pub mod macd;
pub mod momentum;
pub mod moving_average;
pub mod rsi;
pub mod volume;

pub use bollinger::BollingerPosition;
pub use macd::Macd;
pub use momentum::Momentum;
pub use moving_average::MaTrend;
pub use rsi::Rsi;
pub use volume::VolumeMomentum;

use super::Indicator;

/// Get all weighted indicators.
pub fn all_indicators() -> Vec<Box<dyn Indicator>> {
    vec![
        // Momentum
        Box::new(Rsi::default()),
        Box::new(Momentum::default()),
        // Trend
        Box::new(Macd::default()),
        Box::new(MaTrend::default()),
        // Volatility
        Box::new(BollingerPosition::default()),
        // Volume
        Box::new(VolumeMomentum::default()),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::MarketSample;

    pub fn create_uptrend_samples(count: usize) -> Vec<MarketSample> {
        (0..count)
            .map(|i| {
                let close = 100.0 + i as f64 * 1.5;
                MarketSample {
                    timestamp: 1_000_000 + i as i64 * 60_000,
                    open: close - 1.0,
                    high: close + 1.0,
                    low: close - 2.0,
                    close,
                    volume: 1000.0 + i as f64 * 50.0,
                }
            })
            .collect()
    }

    pub fn create_downtrend_samples(count: usize) -> Vec<MarketSample> {
        (0..count)
            .map(|i| {
                let close = 200.0 - i as f64 * 1.5;
                MarketSample {
                    timestamp: 1_000_000 + i as i64 * 60_000,
                    open: close + 1.0,
                    high: close + 2.0,
                    low: close - 1.0,
                    close,
                    volume: 1000.0 + i as f64 * 50.0,
                }
            })
            .collect()
    }

    pub fn create_flat_samples(count: usize) -> Vec<MarketSample> {
        (0..count)
            .map(|i| MarketSample::from_close(1_000_000 + i as i64 * 60_000, 100.0, 1000.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndicatorKind;
    use std::collections::BTreeSet;

    #[test]
    fn test_all_indicators_cover_every_kind() {
        let kinds: BTreeSet<IndicatorKind> = all_indicators().iter().map(|i| i.kind()).collect();
        assert_eq!(kinds.len(), IndicatorKind::ALL.len());
    }

    #[test]
    fn test_contributions_bounded() {
        let inputs = [
            -1e9, -100.0, -1.0, -0.5, -0.01, 0.0, 0.01, 0.15, 0.5, 0.85, 1.0, 25.0, 50.0, 75.0,
            100.0, 1e9,
        ];
        for indicator in all_indicators() {
            for value in inputs {
                let c = indicator.contribution(value);
                assert!(
                    (-1.0..=1.0).contains(&c),
                    "{} contribution {} out of range for {}",
                    indicator.name(),
                    c,
                    value
                );
            }
            assert_eq!(indicator.contribution(f64::NAN), 0.0);
        }
    }
}

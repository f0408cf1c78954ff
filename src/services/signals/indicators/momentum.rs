//! Price momentum indicator.

use crate::services::signals::{clamp_contribution, Indicator};
use crate::types::{IndicatorKind, MarketSample};

/// Rate of change over the last `lookback` samples.
pub struct Momentum {
    lookback: usize,
    scale: f64,
}

impl Default for Momentum {
    fn default() -> Self {
        Self {
            lookback: 5,
            scale: 10.0,
        }
    }
}

impl Indicator for Momentum {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Momentum
    }

    fn name(&self) -> &str {
        "Momentum (5)"
    }

    fn min_periods(&self) -> usize {
        self.lookback
    }

    fn calculate(&self, samples: &[MarketSample]) -> Option<f64> {
        if self.lookback == 0 || samples.len() < self.lookback {
            return None;
        }

        let last = samples.last()?.close;
        let base = samples[samples.len() - self.lookback].close;
        if base <= 0.0 {
            return None;
        }
        Some((last - base) / base)
    }

    fn contribution(&self, value: f64) -> f64 {
        clamp_contribution(value * self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::*;

    #[test]
    fn test_momentum_insufficient_data() {
        assert!(Momentum::default()
            .calculate(&create_uptrend_samples(4))
            .is_none());
    }

    #[test]
    fn test_momentum_value() {
        let samples: Vec<MarketSample> = [100.0, 101.0, 102.0, 103.0, 110.0]
            .iter()
            .enumerate()
            .map(|(i, c)| MarketSample::from_close(i as i64, *c, 1.0))
            .collect();
        let value = Momentum::default().calculate(&samples).unwrap();
        assert!((value - 0.1).abs() < 1e-12);
        assert!((Momentum::default().contribution(value) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_downtrend_negative() {
        let value = Momentum::default()
            .calculate(&create_downtrend_samples(10))
            .unwrap();
        assert!(value < 0.0);
    }
}

//! Volume momentum indicator.

use crate::services::signals::{clamp_contribution, mean, Indicator};
use crate::types::{IndicatorKind, MarketSample};

/// Volume change weighted by the latest price change.
///
/// Rising volume on a rising bar is positive; rising volume on a falling bar
/// is negative.
pub struct VolumeMomentum {
    period: usize,
    scale: f64,
}

impl Default for VolumeMomentum {
    fn default() -> Self {
        Self {
            period: 5,
            scale: 10.0,
        }
    }
}

impl Indicator for VolumeMomentum {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Volume
    }

    fn name(&self) -> &str {
        "Volume Momentum"
    }

    fn min_periods(&self) -> usize {
        self.period * 2
    }

    fn calculate(&self, samples: &[MarketSample]) -> Option<f64> {
        if samples.len() < self.min_periods() {
            return None;
        }

        let volumes: Vec<f64> = samples.iter().map(|s| s.volume).collect();
        let n = volumes.len();
        let recent = mean(&volumes[n - self.period..])?;
        let prior = mean(&volumes[n - 2 * self.period..n - self.period])?;
        if prior <= 0.0 {
            return None;
        }
        let volume_change = (recent - prior) / prior;

        let last = samples[n - 1].close;
        let previous = samples[n - 2].close;
        if previous <= 0.0 {
            return None;
        }
        let price_change = (last - previous) / previous;

        Some(volume_change * price_change)
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
    fn test_volume_min_periods() {
        assert_eq!(VolumeMomentum::default().min_periods(), 10);
        assert!(VolumeMomentum::default()
            .calculate(&create_uptrend_samples(9))
            .is_none());
    }

    #[test]
    fn test_volume_rising_on_up_bars_positive() {
        let value = VolumeMomentum::default()
            .calculate(&create_uptrend_samples(20))
            .unwrap();
        assert!(value > 0.0);
    }

    #[test]
    fn test_volume_rising_on_down_bars_negative() {
        let value = VolumeMomentum::default()
            .calculate(&create_downtrend_samples(20))
            .unwrap();
        assert!(value < 0.0);
    }

    #[test]
    fn test_volume_zero_prior_volume() {
        let samples: Vec<MarketSample> = (0..10)
            .map(|i| MarketSample::from_close(i, 100.0 + i as f64, if i < 5 { 0.0 } else { 10.0 }))
            .collect();
        assert!(VolumeMomentum::default().calculate(&samples).is_none());
    }
}

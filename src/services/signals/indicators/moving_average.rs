//! Moving-average trend indicator.

use crate::services::signals::{clamp_contribution, closes, mean, Indicator};
use crate::types::{IndicatorKind, MarketSample};

/// Relative gap between a short and a long simple moving average.
///
/// `(SMA(10) - SMA(20)) / SMA(20)`; positive while the short average sits
/// above the long one.
pub struct MaTrend {
    short_period: usize,
    long_period: usize,
    scale: f64,
}

impl Default for MaTrend {
    fn default() -> Self {
        Self {
            short_period: 10,
            long_period: 20,
            scale: 10.0,
        }
    }
}

impl Indicator for MaTrend {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::MaTrend
    }

    fn name(&self) -> &str {
        "MA Trend (10/20)"
    }

    fn min_periods(&self) -> usize {
        self.long_period
    }

    fn calculate(&self, samples: &[MarketSample]) -> Option<f64> {
        if samples.len() < self.long_period {
            return None;
        }

        let closes = closes(samples);
        let short = mean(&closes[closes.len() - self.short_period..])?;
        let long = mean(&closes[closes.len() - self.long_period..])?;

        if long <= 0.0 {
            return None;
        }
        Some((short - long) / long)
    }

    fn contribution(&self, trend: f64) -> f64 {
        clamp_contribution(trend * self.scale)
    }
}

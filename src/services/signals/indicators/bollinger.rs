//! Bollinger Bands position indicator.

use crate::services::signals::{clamp_contribution, Indicator};
use crate::types::{IndicatorKind, MarketSample};

/// Contribution magnitude near the bands.
const BAND_CONTRIBUTION: f64 = 0.7;

/// Bollinger Bands %B.
///
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// %B = (Price - Lower) / (Upper - Lower). Price near the lower band reads as
/// oversold (bullish), near the upper band as overbought (bearish).
pub struct BollingerPosition {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerPosition {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerPosition {
    /// Calculate standard deviation.
    fn std_dev(values: &[f64], mean: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let variance: f64 =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }
}

impl Indicator for BollingerPosition {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Bollinger
    }

    fn name(&self) -> &str {
        "Bollinger %B"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, samples: &[MarketSample]) -> Option<f64> {
        if self.period == 0 || samples.len() < self.period {
            return None;
        }

        let closes: Vec<f64> = samples
            .iter()
            .rev()
            .take(self.period)
            .map(|s| s.close)
            .collect();

        let middle = closes.iter().sum::<f64>() / self.period as f64;
        let std_dev = Self::std_dev(&closes, middle);

        let upper = middle + self.std_dev_multiplier * std_dev;
        let lower = middle - self.std_dev_multiplier * std_dev;
        let band_width = upper - lower;

        let current_price = samples.last()?.close;

        if band_width > 0.0 {
            Some((current_price - lower) / band_width)
        } else {
            Some(self.neutral())
        }
    }

    fn neutral(&self) -> f64 {
        0.5
    }

    fn contribution(&self, position: f64) -> f64 {
        let c = if position < 0.2 {
            BAND_CONTRIBUTION
        } else if position > 0.8 {
            -BAND_CONTRIBUTION
        } else {
            (0.5 - position) / 0.3 * BAND_CONTRIBUTION
        };
        clamp_contribution(c)
    }
}

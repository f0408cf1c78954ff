//! MACD (Moving Average Convergence Divergence) indicator.

use crate::services::signals::{closes, Indicator};
use crate::types::{IndicatorKind, MarketSample};

/// MACD histogram indicator.
///
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
///
/// Only the histogram sign contributes to the score.
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    /// Calculate EMA for a series of values, seeded with the SMA of the first period.
    fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
        if period == 0 || values.len() < period {
            return Vec::new();
        }

        let multiplier = 2.0 / (period as f64 + 1.0);
        let seed = values.iter().take(period).sum::<f64>() / period as f64;

        let mut ema = Vec::with_capacity(values.len() - period + 1);
        ema.push(seed);

        let mut prev = seed;
        for value in &values[period..] {
            prev = (value - prev) * multiplier + prev;
            ema.push(prev);
        }

        ema
    }
}

impl Indicator for Macd {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Macd
    }

    fn name(&self) -> &str {
        "MACD Histogram"
    }

    fn min_periods(&self) -> usize {
        self.slow_period + self.signal_period
    }

    fn calculate(&self, samples: &[MarketSample]) -> Option<f64> {
        if samples.len() < self.min_periods() {
            return None;
        }

        let closes = closes(samples);
        let fast_ema = Self::calculate_ema(&closes, self.fast_period);
        let slow_ema = Self::calculate_ema(&closes, self.slow_period);

        // Align the EMAs (fast starts earlier)
        let offset = self.slow_period - self.fast_period;
        let macd_line: Vec<f64> = fast_ema
            .iter()
            .skip(offset)
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        let signal_line = Self::calculate_ema(&macd_line, self.signal_period);

        let macd = macd_line.last()?;
        let signal = signal_line.last()?;
        Some(macd - signal)
    }

    fn contribution(&self, histogram: f64) -> f64 {
        if histogram > 0.0 {
            1.0
        } else if histogram < 0.0 {
            -1.0
        } else {
            0.0
        }
    }
}
